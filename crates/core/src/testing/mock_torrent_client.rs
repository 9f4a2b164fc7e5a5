//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    CategoryCreation, TorrentClient, TorrentClientError, TorrentInfo, TrackerEntry,
};

/// Torrent client operations, for targeted failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Login,
    ListTorrents,
    GetTrackers,
    GetCategories,
    CreateCategory,
    SetCategory,
    AddTags,
}

/// A recorded client call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Login,
    ListTorrents,
    GetTrackers { hash: String },
    GetCategories,
    CreateCategory { name: String },
    SetCategory { hash: String, category: String },
    AddTags { hash: String, tags: Vec<String> },
}

impl RecordedCall {
    /// Whether the call changes state in the client.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            RecordedCall::CreateCategory { .. }
                | RecordedCall::SetCategory { .. }
                | RecordedCall::AddTags { .. }
        )
    }
}

/// Mock implementation of the TorrentClient trait.
///
/// Behaves like qBittorrent where it matters for category sync:
/// - Assigning a category that does not exist fails with `CategoryMissing`
/// - Creating an existing category reports `AlreadyExisted`
/// - Every call before a successful login fails with `AuthenticationFailed`
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_mock_torrent(fixtures::ggn_torrent("abc123", "Super Mario Odyssey")).await;
///
/// client.login().await?;
/// client.create_category("Nintendo/Nintendo Switch/Super Mario Odyssey (2017)").await?;
/// client.set_category("abc123", "Nintendo/Nintendo Switch/Super Mario Odyssey (2017)").await?;
///
/// assert_eq!(client.set_category_calls().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockTorrentClient {
    /// Torrents in listing order.
    torrents: Arc<RwLock<Vec<TorrentInfo>>>,
    /// Tracker lists by hash.
    trackers: Arc<RwLock<HashMap<String, Vec<TrackerEntry>>>>,
    /// Existing categories.
    categories: Arc<RwLock<BTreeSet<String>>>,
    /// Every call made, in order.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    logged_in: Arc<RwLock<bool>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// Operations that always fail.
    failures: Arc<RwLock<HashMap<MockOperation, TorrentClientError>>>,
    /// `set_category` failures for specific hashes.
    set_category_failures: Arc<RwLock<HashMap<String, TorrentClientError>>>,
}

impl Default for MockTorrentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentClient {
    /// Create a new mock torrent client with no torrents or categories.
    pub fn new() -> Self {
        Self {
            torrents: Arc::new(RwLock::new(Vec::new())),
            trackers: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(BTreeSet::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            logged_in: Arc::new(RwLock::new(false)),
            next_error: Arc::new(RwLock::new(None)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            set_category_failures: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Add a torrent to the end of the listing.
    pub async fn add_mock_torrent(&self, info: TorrentInfo) {
        self.torrents.write().await.push(info);
    }

    /// Set the tracker list returned for `hash`.
    pub async fn set_trackers(&self, hash: &str, trackers: Vec<TrackerEntry>) {
        self.trackers.write().await.insert(hash.to_string(), trackers);
    }

    /// Make a category exist.
    pub async fn add_category(&self, name: &str) {
        self.categories.write().await.insert(name.to_string());
    }

    /// Delete a category, as if removed by the user mid-run.
    pub async fn remove_category(&self, name: &str) {
        self.categories.write().await.remove(name);
    }

    /// Make the next operation fail with `error`.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every call of `operation` fail with `error`.
    pub async fn fail_operation(&self, operation: MockOperation, error: TorrentClientError) {
        self.failures.write().await.insert(operation, error);
    }

    /// Make `set_category` fail for `hash` only.
    pub async fn fail_set_category(&self, hash: &str, error: TorrentClientError) {
        self.set_category_failures
            .write()
            .await
            .insert(hash.to_string(), error);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Current state of a torrent.
    pub async fn torrent(&self, hash: &str) -> Option<TorrentInfo> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.hash == hash)
            .cloned()
    }

    /// Existing categories, sorted.
    pub async fn categories(&self) -> Vec<String> {
        self.categories.read().await.iter().cloned().collect()
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Calls that modify client state.
    pub async fn write_calls(&self) -> Vec<RecordedCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    /// `(hash, category)` for every `set_category` call.
    pub async fn set_category_calls(&self) -> Vec<(String, String)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedCall::SetCategory { hash, category } => {
                    Some((hash.clone(), category.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Names passed to `create_category`, in order.
    pub async fn create_category_calls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedCall::CreateCategory { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Hashes passed to `get_trackers`, in order.
    pub async fn get_trackers_calls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedCall::GetTrackers { hash } => Some(hash.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn record(&self, call: RecordedCall) {
        self.calls.write().await.push(call);
    }

    /// Pending error for `operation`: one-shot first, then persistent.
    async fn take_error(&self, operation: MockOperation) -> Option<TorrentClientError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Some(error);
        }
        self.failures.read().await.get(&operation).cloned()
    }

    async fn check(&self, operation: MockOperation) -> Result<(), TorrentClientError> {
        if let Some(error) = self.take_error(operation).await {
            return Err(error);
        }
        if !*self.logged_in.read().await {
            return Err(TorrentClientError::AuthenticationFailed(
                "not logged in".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<(), TorrentClientError> {
        self.record(RecordedCall::Login).await;
        if let Some(error) = self.take_error(MockOperation::Login).await {
            return Err(error);
        }
        *self.logged_in.write().await = true;
        Ok(())
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        self.record(RecordedCall::ListTorrents).await;
        self.check(MockOperation::ListTorrents).await?;
        Ok(self.torrents.read().await.clone())
    }

    async fn get_trackers(&self, hash: &str) -> Result<Vec<TrackerEntry>, TorrentClientError> {
        self.record(RecordedCall::GetTrackers {
            hash: hash.to_string(),
        })
        .await;
        self.check(MockOperation::GetTrackers).await?;
        Ok(self
            .trackers
            .read()
            .await
            .get(hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_categories(&self) -> Result<Vec<String>, TorrentClientError> {
        self.record(RecordedCall::GetCategories).await;
        self.check(MockOperation::GetCategories).await?;
        Ok(self.categories().await)
    }

    async fn create_category(&self, name: &str) -> Result<CategoryCreation, TorrentClientError> {
        self.record(RecordedCall::CreateCategory {
            name: name.to_string(),
        })
        .await;
        self.check(MockOperation::CreateCategory).await?;

        if self.categories.write().await.insert(name.to_string()) {
            Ok(CategoryCreation::Created)
        } else {
            Ok(CategoryCreation::AlreadyExisted)
        }
    }

    async fn set_category(&self, hash: &str, category: &str) -> Result<(), TorrentClientError> {
        self.record(RecordedCall::SetCategory {
            hash: hash.to_string(),
            category: category.to_string(),
        })
        .await;
        self.check(MockOperation::SetCategory).await?;

        if let Some(error) = self.set_category_failures.read().await.get(hash) {
            return Err(error.clone());
        }
        if !self.categories.read().await.contains(category) {
            return Err(TorrentClientError::CategoryMissing(category.to_string()));
        }

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .iter_mut()
            .find(|t| t.hash == hash)
            .ok_or_else(|| TorrentClientError::ApiError(format!("unknown torrent: {}", hash)))?;
        torrent.category = Some(category.to_string());
        Ok(())
    }

    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError> {
        self.record(RecordedCall::AddTags {
            hash: hash.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
        .await;
        self.check(MockOperation::AddTags).await?;

        let mut torrents = self.torrents.write().await;
        if let Some(torrent) = torrents.iter_mut().find(|t| t.hash == hash) {
            for tag in tags {
                if !torrent.has_tag(tag) {
                    torrent.tags.push(tag.to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_requires_login() {
        let client = MockTorrentClient::new();
        let result = client.list_torrents().await;
        assert!(matches!(result, Err(TorrentClientError::AuthenticationFailed(_))));

        client.login().await.unwrap();
        assert!(client.list_torrents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_category_requires_existing_category() {
        let client = MockTorrentClient::new();
        client.add_mock_torrent(fixtures::ggn_torrent("abc", "Doom")).await;
        client.login().await.unwrap();

        let result = client.set_category("abc", "Microsoft/Windows/Doom").await;
        assert_eq!(
            result,
            Err(TorrentClientError::CategoryMissing("Microsoft/Windows/Doom".to_string()))
        );

        assert_eq!(
            client.create_category("Microsoft/Windows/Doom").await.unwrap(),
            CategoryCreation::Created
        );
        assert_eq!(
            client.create_category("Microsoft/Windows/Doom").await.unwrap(),
            CategoryCreation::AlreadyExisted
        );

        client.set_category("abc", "Microsoft/Windows/Doom").await.unwrap();
        let torrent = client.torrent("abc").await.unwrap();
        assert_eq!(torrent.category.as_deref(), Some("Microsoft/Windows/Doom"));
    }

    #[tokio::test]
    async fn test_add_tags_is_idempotent() {
        let client = MockTorrentClient::new();
        client.add_mock_torrent(fixtures::ggn_torrent("abc", "Doom")).await;
        client.login().await.unwrap();

        client.add_tags("abc", &["GGn-Sorted"]).await.unwrap();
        client.add_tags("abc", &["GGn-Sorted"]).await.unwrap();
        assert_eq!(client.torrent("abc").await.unwrap().tags, vec!["GGn-Sorted"]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let client = MockTorrentClient::new();
        client.login().await.unwrap();

        client.set_next_error(TorrentClientError::Timeout).await;
        assert_eq!(client.get_categories().await, Err(TorrentClientError::Timeout));
        assert!(client.get_categories().await.is_ok());

        client
            .fail_operation(
                MockOperation::GetCategories,
                TorrentClientError::ApiError("boom".to_string()),
            )
            .await;
        assert!(client.get_categories().await.is_err());
        assert!(client.get_categories().await.is_err());
    }

    #[tokio::test]
    async fn test_records_calls() {
        let client = MockTorrentClient::new();
        client.login().await.unwrap();
        client.create_category("A").await.unwrap();
        client.get_trackers("abc").await.unwrap();

        assert_eq!(
            client.calls().await,
            vec![
                RecordedCall::Login,
                RecordedCall::CreateCategory {
                    name: "A".to_string()
                },
                RecordedCall::GetTrackers {
                    hash: "abc".to_string()
                },
            ]
        );
        assert_eq!(client.write_calls().await.len(), 1);
        assert_eq!(client.create_category_calls().await, vec!["A"]);
        assert_eq!(client.get_trackers_calls().await, vec!["abc"]);
    }
}
