//! Category sync implementation.
//!
//! One pass over the torrent list, strictly sequential:
//! authenticate, seed the known categories, then for each torrent look up
//! its metadata, derive the category, make sure it exists and assign it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::category::CategoryDeriver;
use crate::metadata::MetadataProvider;
use crate::torrent_client::{CategoryCreation, TorrentClient, TorrentClientError, TorrentInfo};

use super::config::SyncOptions;
use super::types::{KnownCategories, SkipReason, SyncError, SyncOutcome, SyncReport, TorrentOutcome};

/// Assigns tracker-derived categories to torrents.
pub struct CategorySync {
    options: SyncOptions,
    torrent_client: Arc<dyn TorrentClient>,
    metadata: Arc<dyn MetadataProvider>,
    deriver: CategoryDeriver,
}

impl CategorySync {
    pub fn new(
        options: SyncOptions,
        torrent_client: Arc<dyn TorrentClient>,
        metadata: Arc<dyn MetadataProvider>,
        deriver: CategoryDeriver,
    ) -> Self {
        Self {
            options,
            torrent_client,
            metadata,
            deriver,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Full run: authenticate, read existing categories, process every torrent.
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        self.authenticate().await?;
        let known = self.fetch_known_categories().await;
        self.reconcile(known).await
    }

    /// Log in to the torrent client and the metadata provider.
    pub async fn authenticate(&self) -> Result<(), SyncError> {
        self.torrent_client.login().await.map_err(|e| {
            SyncError::Authentication(format!("{}: {}", self.torrent_client.name(), e))
        })?;
        info!("Logged in to {}", self.torrent_client.name());

        self.metadata.authenticate().await.map_err(|e| {
            SyncError::Authentication(format!("{}: {}", self.metadata.name(), e))
        })?;
        info!("Authenticated with {}", self.metadata.name());

        Ok(())
    }

    /// Categories that already exist in the client.
    ///
    /// A failure is not fatal: the run starts with an empty set and relies on
    /// creation being idempotent.
    pub async fn fetch_known_categories(&self) -> KnownCategories {
        match self.torrent_client.get_categories().await {
            Ok(categories) => {
                debug!("Found {} existing categories", categories.len());
                categories.into_iter().collect()
            }
            Err(e) => {
                warn!("Failed to read existing categories, starting empty: {}", e);
                KnownCategories::new()
            }
        }
    }

    /// Process every torrent once, starting from `known`.
    ///
    /// Requires an authenticated session. Per-torrent errors end up in the
    /// report; only a failure to list torrents aborts.
    pub async fn reconcile(&self, mut known: KnownCategories) -> Result<SyncOutcome, SyncError> {
        let torrents = self
            .torrent_client
            .list_torrents()
            .await
            .map_err(SyncError::ListTorrents)?;

        info!(
            "Processing {} torrents (dry_run={}, overwrite_existing={})",
            torrents.len(),
            self.options.dry_run,
            self.options.overwrite_existing
        );

        if known.is_empty() {
            debug!("No known categories, each one is created on first use");
        }

        let mut report = SyncReport::default();
        for torrent in &torrents {
            let outcome = self.process_torrent(torrent, &mut known).await;
            if let TorrentOutcome::Failed { error } = &outcome {
                warn!("Failed to update '{}' ({}): {}", torrent.name, torrent.hash, error);
            }
            report.record(&torrent.hash, &torrent.name, outcome);
        }

        info!("Sync finished: {}", report);
        if report.skipped() > 0 {
            debug!(
                "Skipped: {} already sorted, {} other tracker, {} already categorized, {} not found, {} unchanged, {} dry run",
                report.skipped_for(SkipReason::AlreadySorted),
                report.skipped_for(SkipReason::OtherTracker),
                report.skipped_for(SkipReason::AlreadyCategorized),
                report.skipped_for(SkipReason::NotFound),
                report.skipped_for(SkipReason::Unchanged),
                report.skipped_for(SkipReason::DryRun),
            );
        }

        Ok(SyncOutcome {
            report,
            known_categories: known,
        })
    }

    async fn process_torrent(&self, torrent: &TorrentInfo, known: &mut KnownCategories) -> TorrentOutcome {
        if let Some(tag) = self.options.sorted_tag.as_deref() {
            if torrent.has_tag(tag) {
                debug!("Skipping '{}': already tagged {}", torrent.name, tag);
                return TorrentOutcome::skipped(SkipReason::AlreadySorted);
            }
        }

        match self.is_target_tracker(torrent).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Skipping '{}': not a {} torrent", torrent.name, self.options.tracker_host);
                return TorrentOutcome::skipped(SkipReason::OtherTracker);
            }
            Err(e) => return TorrentOutcome::failed(format!("tracker list: {}", e)),
        }

        if let Some(current) = torrent.category.as_deref() {
            if !self.options.overwrite_existing {
                debug!("Skipping '{}': already in category '{}'", torrent.name, current);
                return TorrentOutcome::skipped(SkipReason::AlreadyCategorized);
            }
        }

        let metadata = match self.metadata.lookup_by_hash(&torrent.hash).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                info!("'{}' ({}) not found on {}", torrent.name, torrent.hash, self.metadata.name());
                return TorrentOutcome::skipped(SkipReason::NotFound);
            }
            Err(e) => return TorrentOutcome::failed(format!("metadata lookup: {}", e)),
        };

        let category = match self.deriver.derive(&metadata) {
            Ok(category) => category,
            Err(e) => return TorrentOutcome::failed(e),
        };

        if torrent.category.as_deref() == Some(category.as_str()) {
            debug!("'{}' already in '{}'", torrent.name, category);
            return TorrentOutcome::skipped(SkipReason::Unchanged);
        }

        if self.options.dry_run {
            info!("[dry run] '{}' -> '{}'", torrent.name, category);
            return TorrentOutcome::skipped(SkipReason::DryRun);
        }

        if let Err(e) = self.assign_category(&torrent.hash, &category, known).await {
            return TorrentOutcome::failed(e);
        }
        info!("'{}' -> '{}'", torrent.name, category);

        if let Some(tag) = self.options.sorted_tag.as_deref() {
            if let Err(e) = self.torrent_client.add_tags(&torrent.hash, &[tag]).await {
                warn!("Failed to tag '{}' with {}: {}", torrent.name, tag, e);
            }
        }

        TorrentOutcome::Updated { category }
    }

    /// Match the reported tracker first, then every tracker of the torrent.
    ///
    /// The reported one is only the tracker currently in use, so a
    /// multi-tracker torrent can carry the target further down its list.
    async fn is_target_tracker(&self, torrent: &TorrentInfo) -> Result<bool, TorrentClientError> {
        if let Some(url) = torrent.tracker.as_deref() {
            if self.options.matches_tracker(url) {
                return Ok(true);
            }
        }

        let trackers = self.torrent_client.get_trackers(&torrent.hash).await?;
        let mut real = trackers.iter().filter(|t| !t.is_pseudo()).peekable();
        if real.peek().is_none() {
            debug!("'{}' has no trackers besides DHT/PeX/LSD", torrent.name);
            return Ok(false);
        }

        for tracker in real {
            if self.options.matches_tracker(&tracker.url) {
                return Ok(true);
            }
            debug!(
                "'{}' tracker {} does not match ({})",
                torrent.name,
                tracker.url,
                if tracker.message.is_empty() { "no message" } else { tracker.message.as_str() }
            );
        }
        Ok(false)
    }

    /// Create `category` unless it is already known to exist.
    async fn ensure_category(
        &self,
        category: &str,
        known: &mut KnownCategories,
    ) -> Result<(), TorrentClientError> {
        if known.contains(category) {
            return Ok(());
        }

        match self.torrent_client.create_category(category).await? {
            CategoryCreation::Created => info!("Created category '{}'", category),
            CategoryCreation::AlreadyExisted => debug!("Category '{}' already exists", category),
        }
        known.insert(category);
        Ok(())
    }

    /// Assign `category`, creating it first if needed.
    ///
    /// If the client reports the category missing anyway (deleted since the
    /// run started), it is recreated and the assignment retried once.
    async fn assign_category(
        &self,
        hash: &str,
        category: &str,
        known: &mut KnownCategories,
    ) -> Result<(), TorrentClientError> {
        self.ensure_category(category, known).await?;

        match self.torrent_client.set_category(hash, category).await {
            Err(TorrentClientError::CategoryMissing(_)) => {
                warn!("Category '{}' is missing, recreating", category);
                known.remove(category);
                self.ensure_category(category, known).await?;
                self.torrent_client.set_category(hash, category).await
            }
            other => other,
        }
    }
}
