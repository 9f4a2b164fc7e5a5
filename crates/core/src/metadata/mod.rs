//! Release metadata lookup against the tracker API.
//!
//! The `MetadataProvider` trait hides the tracker behind two calls: a key
//! check at startup and a lookup by content hash.

mod gazelle;
mod types;

pub use gazelle::{GazelleGamesClient, RequestPacer};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the metadata provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API key rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Trait for metadata providers.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Verify the credentials before the run starts.
    async fn authenticate(&self) -> Result<(), MetadataError>;

    /// Look up release metadata by content hash.
    ///
    /// Returns `Ok(None)` when the provider has no record for the hash.
    async fn lookup_by_hash(&self, hash: &str) -> Result<Option<ReleaseMetadata>, MetadataError>;
}
