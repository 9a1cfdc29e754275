mod normalizer;
mod scaler;
mod store;

pub use normalizer::{normalize, normalize_raw, NormalizeError};
pub use scaler::scale;
pub use store::RecipeStore;
