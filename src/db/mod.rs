mod derived;
mod repository;
mod schema;

pub(crate) use repository::average;
pub use repository::Repository;
