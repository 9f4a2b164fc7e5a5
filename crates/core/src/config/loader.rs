use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "catsync.toml";

/// Required environment variables and the config field each one fills.
pub const REQUIRED_VARS: [(&str, &str); 4] = [
    ("QB_HOST", "qbittorrent.url"),
    ("QB_USERNAME", "qbittorrent.username"),
    ("QB_PASSWORD", "qbittorrent.password"),
    ("GGN_API_KEY", "tracker.api_key"),
];

/// Load configuration from an optional TOML file, the required
/// `QB_*`/`GGN_*` variables, and `CATSYNC_` overrides (in that order).
///
/// Missing required values are not an error here; `validate_config`
/// reports them all at once.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    // Read verbatim so numeric-looking passwords stay strings.
    for (var, field) in REQUIRED_VARS {
        if let Ok(value) = std::env::var(var) {
            figment = figment.merge(Serialized::default(field, value));
        }
    }

    figment
        .merge(Env::prefixed("CATSYNC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
