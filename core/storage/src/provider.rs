//! Remote source trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dropweb_common::{Error, Result};

/// Response from the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Validator that changes whenever the content changes.
    pub etag: Option<String>,
    /// Content bytes (empty for probes).
    pub body: Vec<u8>,
}

impl RemoteResponse {
    /// Create a successful response.
    pub fn ok(etag: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            etag,
            body,
        }
    }

    /// Create a response with only a status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            etag: None,
            body: Vec::new(),
        }
    }

    /// Check whether the status is in the success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check whether the source refused a metadata-only request.
    ///
    /// Sources that answer probes this way only support full fetches.
    pub fn probe_unsupported(&self) -> bool {
        matches!(self.status, 405 | 501)
    }

    /// Turn a non-success status into a fetch error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Fetch {
                status: self.status,
            })
        }
    }

    /// Validator, treating an empty header as absent.
    pub fn validator(&self) -> Option<&str> {
        self.etag.as_deref().filter(|etag| !etag.is_empty())
    }
}

/// Remote object store holding published documents.
///
/// Implementations perform exactly one request per call and report
/// transport failures as `Error::Network` or `Error::Timeout`.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Get the source name (e.g., "http", "memory").
    fn name(&self) -> &str;

    /// Issue a metadata-only request (HEAD).
    ///
    /// # Postconditions
    /// - Returned body is empty
    ///
    /// # Errors
    /// - Network/timeout errors
    async fn probe(&self, url: &str) -> Result<RemoteResponse>;

    /// Issue a full content request (GET).
    ///
    /// # Errors
    /// - Network/timeout errors
    async fn fetch(&self, url: &str) -> Result<RemoteResponse>;
}
