//! Remote store error types.

use thiserror::Error;

/// Error returned by the remote store, its auth endpoint or its functions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or expired session
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Row-level authorization or role check refused the call
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected because other rows still reference the target
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request payload rejected
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Any other non-success status
    #[error("Remote store error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Map a non-success HTTP status and its extracted message to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => StoreError::BadRequest(message),
            401 => StoreError::Unauthorized(message),
            403 => StoreError::Forbidden(message),
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            _ => StoreError::Api { status, message },
        }
    }
}
