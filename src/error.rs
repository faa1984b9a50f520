//! Crate-wide error type.
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not found")]
    NotFound,

    #[error("already exists: {0}")]
    Duplicate(String),

    #[error("database connection is poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
