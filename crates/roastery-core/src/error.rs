// Error types shared by every storage backend

use thiserror::Error;

use crate::coffee::CoffeeId;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by repositories and units of work
#[derive(Debug, Error)]
pub enum StoreError {
    /// No coffee with this id
    #[error("coffee not found: {0}")]
    CoffeeNotFound(CoffeeId),

    /// Concurrent writers collided (unique violation, serialization failure)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn database(msg: impl Into<String>) -> Self {
        StoreError::Database(msg.into())
    }
}
