pub mod category;
pub mod config;
pub mod metadata;
pub mod sync;
pub mod testing;
pub mod torrent_client;

pub use category::{derive_category, CategoryDeriver, CategoryError, CategoryOptions, PlatformTable};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use metadata::{GazelleGamesClient, MetadataError, MetadataProvider, ReleaseMetadata};
pub use sync::{CategorySync, KnownCategories, SyncError, SyncOptions, SyncOutcome, SyncReport};
pub use torrent_client::{QBittorrentClient, TorrentClient, TorrentClientError, TorrentInfo};
