//! Common error types for dropweb.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for dropweb operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Account setup is missing or ambiguous.
    ///
    /// Not retryable without administrative action.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote source answered with a non-success status.
    #[error("Fetch failed with status {status}")]
    Fetch { status: u16 },

    /// Remote request did not complete within the configured bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure talking to the remote source.
    #[error("Network error: {0}")]
    Network(String),

    /// Page metadata header is malformed.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Page store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this error came from the remote fetch boundary.
    ///
    /// Fetch failures are recoverable by the caller and never leave the
    /// cached page in a modified state.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. } | Error::Timeout(_) | Error::Network(_)
        )
    }

    /// HTTP-style status to report for this error, if it carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
