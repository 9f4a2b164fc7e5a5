use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// qBittorrent Web API connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI base URL (e.g., "http://localhost:8080"). Env: `QB_HOST`.
    #[serde(default)]
    pub url: String,
    /// Env: `QB_USERNAME`.
    #[serde(default)]
    pub username: String,
    /// Env: `QB_PASSWORD`.
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_qbittorrent_timeout")]
    pub timeout_secs: u32,
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_qbittorrent_timeout(),
        }
    }
}

fn default_qbittorrent_timeout() -> u32 {
    10
}

/// GazelleGames tracker API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Env: `GGN_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    /// API endpoint (default: https://gazellegames.net/api.php)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Torrents are only touched when their tracker URL contains this host.
    #[serde(default = "default_tracker_host")]
    pub host: String,
    /// Fixed delay slept before every metadata lookup.
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_tracker_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            host: default_tracker_host(),
            request_interval_ms: default_request_interval_ms(),
            timeout_secs: default_tracker_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://gazellegames.net/api.php".to_string()
}

fn default_tracker_host() -> String {
    "gazellegames.net".to_string()
}

fn default_request_interval_ms() -> u64 {
    1000
}

fn default_tracker_timeout() -> u32 {
    15
}

fn default_user_agent() -> String {
    format!("catsync/{}", env!("CARGO_PKG_VERSION"))
}

/// Reconciliation behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Re-derive categories for torrents that already have one.
    #[serde(default)]
    pub overwrite_existing: bool,
    /// Log the derived categories without writing anything back.
    #[serde(default)]
    pub dry_run: bool,
    /// Tag added to processed torrents; tagged torrents are skipped.
    /// An empty string disables tagging.
    #[serde(default = "default_sorted_tag")]
    pub sorted_tag: String,
    /// Optional leading category segment (e.g., "Games").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_prefix: Option<String>,
    /// Append the release type (DLC, Update, ...) as a trailing segment.
    #[serde(default)]
    pub include_release_type: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            dry_run: false,
            sorted_tag: default_sorted_tag(),
            category_prefix: None,
            include_release_type: false,
        }
    }
}

impl SyncConfig {
    /// The sorted tag, or `None` when tagging is disabled.
    pub fn sorted_tag(&self) -> Option<&str> {
        let tag = self.sorted_tag.trim();
        if tag.is_empty() {
            None
        } else {
            Some(tag)
        }
    }
}

fn default_sorted_tag() -> String {
    "GGn-Sorted".to_string()
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub tracker: SanitizedTrackerConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrackerConfig {
    pub api_url: String,
    pub host: String,
    pub api_key_configured: bool,
    pub request_interval_ms: u64,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.url.clone(),
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            tracker: SanitizedTrackerConfig {
                api_url: config.tracker.api_url.clone(),
                host: config.tracker.host.clone(),
                api_key_configured: !config.tracker.api_key.is_empty(),
                request_interval_ms: config.tracker.request_interval_ms,
                timeout_secs: config.tracker.timeout_secs,
            },
            sync: config.sync.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.qbittorrent.url.is_empty());
        assert_eq!(config.qbittorrent.timeout_secs, 10);
        assert_eq!(config.tracker.api_url, "https://gazellegames.net/api.php");
        assert_eq!(config.tracker.host, "gazellegames.net");
        assert_eq!(config.tracker.request_interval_ms, 1000);
        assert!(!config.sync.overwrite_existing);
        assert!(!config.sync.dry_run);
        assert_eq!(config.sync.sorted_tag(), Some("GGn-Sorted"));
        assert!(config.sync.category_prefix.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[qbittorrent]
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
timeout_secs = 5

[tracker]
api_key = "key"
request_interval_ms = 2000

[sync]
dry_run = true
sorted_tag = ""
category_prefix = "Games"
include_release_type = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.qbittorrent.url, "http://localhost:8080");
        assert_eq!(config.qbittorrent.timeout_secs, 5);
        assert_eq!(config.tracker.request_interval_ms, 2000);
        assert!(config.sync.dry_run);
        assert_eq!(config.sync.sorted_tag(), None);
        assert_eq!(config.sync.category_prefix.as_deref(), Some("Games"));
        assert!(config.sync.include_release_type);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.qbittorrent.password = "hunter2".to_string();
        config.tracker.api_key = "secret-key".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.qbittorrent.password_configured);
        assert!(sanitized.tracker.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("secret-key"));
    }
}
