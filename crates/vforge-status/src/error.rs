//! Status store error types.

use thiserror::Error;

/// Result type for status store operations.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors that can occur while reading or writing job snapshots.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StatusError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
