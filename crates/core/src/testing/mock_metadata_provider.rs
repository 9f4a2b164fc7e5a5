//! Mock metadata provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{MetadataError, MetadataProvider, ReleaseMetadata};

/// Mock implementation of the MetadataProvider trait.
///
/// Provides controllable behavior for testing:
/// - Return configured metadata by hash (case-insensitive)
/// - Track lookups for assertions
/// - Simulate authentication and lookup failures
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockMetadataProvider::new();
/// provider
///     .add_release("abc123", ReleaseMetadata::new("Switch", "Hades").with_year(2020))
///     .await;
///
/// let meta = provider.lookup_by_hash("ABC123").await?;
/// assert!(meta.is_some());
/// assert_eq!(provider.lookups().await, vec!["ABC123"]);
/// ```
#[derive(Debug)]
pub struct MockMetadataProvider {
    /// Metadata by lowercase hash.
    releases: Arc<RwLock<HashMap<String, ReleaseMetadata>>>,
    /// Hashes looked up, as passed.
    lookups: Arc<RwLock<Vec<String>>>,
    /// Lookup failures by lowercase hash: (HTTP status, message).
    failures: Arc<RwLock<HashMap<String, (u16, String)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<MetadataError>>>,
    reject_auth: Arc<RwLock<bool>>,
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataProvider {
    /// Create a provider that knows no hashes.
    pub fn new() -> Self {
        Self {
            releases: Arc::new(RwLock::new(HashMap::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            reject_auth: Arc::new(RwLock::new(false)),
        }
    }

    /// Register metadata for `hash`.
    pub async fn add_release(&self, hash: &str, metadata: ReleaseMetadata) {
        self.releases
            .write()
            .await
            .insert(hash.to_lowercase(), metadata);
    }

    /// Make lookups of `hash` fail with an API error.
    pub async fn fail_lookup(&self, hash: &str, status: u16, message: &str) {
        self.failures
            .write()
            .await
            .insert(hash.to_lowercase(), (status, message.to_string()));
    }

    /// Make the next operation fail with `error`.
    pub async fn set_next_error(&self, error: MetadataError) {
        *self.next_error.write().await = Some(error);
    }

    /// Reject the API key on `authenticate`.
    pub async fn reject_authentication(&self) {
        *self.reject_auth.write().await = true;
    }

    /// Hashes looked up so far, in order.
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }

    /// Number of lookups made.
    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }

    async fn take_error(&self) -> Option<MetadataError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    async fn authenticate(&self) -> Result<(), MetadataError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        if *self.reject_auth.read().await {
            return Err(MetadataError::AuthenticationFailed(
                "API key rejected".to_string(),
            ));
        }
        Ok(())
    }

    async fn lookup_by_hash(&self, hash: &str) -> Result<Option<ReleaseMetadata>, MetadataError> {
        self.lookups.write().await.push(hash.to_string());

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        let key = hash.to_lowercase();
        if let Some((status, message)) = self.failures.read().await.get(&key) {
            return Err(MetadataError::ApiError {
                status: *status,
                message: message.clone(),
            });
        }

        Ok(self.releases.read().await.get(&key).cloned())
    }
}
