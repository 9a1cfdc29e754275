//! Recipe discovery core: normalizes third-party recipe payloads into a
//! canonical SQLite-backed store and keeps per-user favorites, ratings,
//! search history and shopping lists against it.

pub mod accounts;
pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod recipes;
pub mod source;

pub use app::App;
pub use config::Config;
pub use error::{AppError, ErrorKind, Result};
