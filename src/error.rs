use thiserror::Error;

use crate::recipes::NormalizeError;
use crate::source::SourceError;

/// Coarse outcome classes the routing layer maps onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    Invalid,
    Unavailable,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Recipe {0} not found")]
    RecipeNotFound(i64),

    #[error("Recipe {0} is already in favorites")]
    AlreadyFavorited(i64),

    #[error("Recipe {0} is not in favorites")]
    NotFavorited(i64),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("Shopping list {0} not found")]
    ShoppingListNotFound(i64),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Recipe source error: {0}")]
    Source(#[from] SourceError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::RecipeNotFound(_)
            | AppError::NotFavorited(_)
            | AppError::ShoppingListNotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized | AppError::InvalidCredentials => ErrorKind::Unauthorized,
            AppError::AlreadyFavorited(_) | AppError::UsernameTaken | AppError::EmailTaken => {
                ErrorKind::Conflict
            }
            AppError::InvalidRating(_) | AppError::InvalidInput(_) => ErrorKind::Invalid,
            AppError::Source(_) => ErrorKind::Unavailable,
            // A payload that fails to normalize is indistinguishable from a missing recipe.
            AppError::Normalize(_) => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
