//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The category named in a request does not exist.
    #[error("Category does not exist: {0}")]
    CategoryMissing(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Information about a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// Category, `None` when unassigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tags attached to the torrent.
    #[serde(default)]
    pub tags: Vec<String>,
    /// URL of the tracker currently in use, when the client reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker: Option<String>,
}

impl TorrentInfo {
    /// Whether the torrent carries `tag` (case-sensitive, like qBittorrent).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A tracker announce entry for a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    pub url: String,
    /// Free-form status message reported by the client.
    #[serde(default)]
    pub message: String,
}

impl TrackerEntry {
    /// DHT, PeX and LSD show up as pseudo-trackers like `** [DHT] **`.
    pub fn is_pseudo(&self) -> bool {
        self.url.starts_with("** [")
    }
}

/// Result of a category creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryCreation {
    Created,
    AlreadyExisted,
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Establish a session. Must succeed before any other call.
    async fn login(&self) -> Result<(), TorrentClientError>;

    /// List all torrents visible to the account.
    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError>;

    /// List the trackers of a torrent.
    async fn get_trackers(&self, hash: &str) -> Result<Vec<TrackerEntry>, TorrentClientError>;

    /// Names of all existing categories.
    async fn get_categories(&self) -> Result<Vec<String>, TorrentClientError>;

    /// Create a category. An existing category is not an error.
    async fn create_category(&self, name: &str) -> Result<CategoryCreation, TorrentClientError>;

    /// Assign a category to a torrent.
    ///
    /// Fails with `CategoryMissing` when the category does not exist.
    async fn set_category(&self, hash: &str, category: &str) -> Result<(), TorrentClientError>;

    /// Add tags to a torrent.
    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError>;
}
