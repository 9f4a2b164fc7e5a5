//! Run options for the category sync.

use crate::config::Config;

/// Options controlling which torrents are touched and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Host fragment identifying the target tracker (e.g., "gazellegames.net").
    pub tracker_host: String,
    /// Re-derive categories for torrents that already have one.
    pub overwrite_existing: bool,
    /// Log the derived categories without writing anything back.
    pub dry_run: bool,
    /// Tag marking processed torrents. `None` disables tagging and the
    /// matching skip.
    pub sorted_tag: Option<String>,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tracker_host: config.tracker.host.trim().to_string(),
            overwrite_existing: config.sync.overwrite_existing,
            dry_run: config.sync.dry_run,
            sorted_tag: config.sync.sorted_tag().map(str::to_string),
        }
    }

    /// Case-insensitive substring match of the tracker host against `url`.
    pub fn matches_tracker(&self, url: &str) -> bool {
        if self.tracker_host.is_empty() {
            return false;
        }
        url.to_lowercase()
            .contains(&self.tracker_host.to_lowercase())
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
