//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-layer failure (DNS, refused connection, dropped socket)
    #[error("Connection Error: {0}")]
    Network(String),

    /// Request hit the abort timeout
    #[error("Connection Error: request timed out")]
    Timeout,

    /// Authentication required; the session has been cleared
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error, caught before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business error reported by the backend (e.g. service unavailable)
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Classify a transport error from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Whether this is a connectivity problem (vs. an application error).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_transport(err)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
