mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str, DEFAULT_CONFIG_FILE, REQUIRED_VARS};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required environment variable(s): {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
