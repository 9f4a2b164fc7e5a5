//! Testing utilities and mock implementations.
//!
//! Mocks for both adapters, so a full sync run can be exercised without a
//! qBittorrent instance or tracker access.
//!
//! # Example
//!
//! ```rust,ignore
//! use catsync_core::testing::{fixtures, MockMetadataProvider, MockTorrentClient};
//!
//! let client = MockTorrentClient::new();
//! let provider = MockMetadataProvider::new();
//!
//! client.add_mock_torrent(fixtures::ggn_torrent("abc123", "Hades")).await;
//! provider.add_release("abc123", fixtures::release("Nintendo", "Switch", "Hades", 2020)).await;
//! ```

mod mock_metadata_provider;
mod mock_torrent_client;

pub use mock_metadata_provider::MockMetadataProvider;
pub use mock_torrent_client::{MockOperation, MockTorrentClient, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::metadata::ReleaseMetadata;
    use crate::torrent_client::{TorrentInfo, TrackerEntry};

    /// Announce URL on the default target tracker.
    pub const GGN_ANNOUNCE: &str = "https://tracker.gazellegames.net/0123456789abcdef/announce";

    /// Announce URL on an unrelated public tracker.
    pub const OTHER_ANNOUNCE: &str = "udp://tracker.opentrackr.org:1337/announce";

    /// A torrent from the target tracker, uncategorized and untagged.
    pub fn ggn_torrent(hash: &str, name: &str) -> TorrentInfo {
        torrent(hash, name, Some(GGN_ANNOUNCE))
    }

    /// A torrent from an unrelated tracker.
    pub fn other_torrent(hash: &str, name: &str) -> TorrentInfo {
        torrent(hash, name, Some(OTHER_ANNOUNCE))
    }

    /// A torrent with an explicit tracker URL (`None` for "not reported").
    pub fn torrent(hash: &str, name: &str, tracker: Option<&str>) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: name.to_string(),
            category: None,
            tags: Vec::new(),
            tracker: tracker.map(str::to_string),
        }
    }

    /// A tracker entry as listed by the client.
    pub fn tracker_entry(url: &str) -> TrackerEntry {
        TrackerEntry {
            url: url.to_string(),
            message: String::new(),
        }
    }

    /// The DHT, PeX and LSD pseudo-entries qBittorrent lists first.
    pub fn pseudo_trackers() -> Vec<TrackerEntry> {
        ["** [DHT] **", "** [PeX] **", "** [LSD] **"]
            .into_iter()
            .map(tracker_entry)
            .collect()
    }

    /// Release metadata with every base field set.
    pub fn release(manufacturer: &str, platform: &str, title: &str, year: u32) -> ReleaseMetadata {
        ReleaseMetadata::new(platform, title)
            .with_manufacturer(manufacturer)
            .with_year(year)
    }
}
