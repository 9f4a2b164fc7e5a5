use super::{loader::REQUIRED_VARS, types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Every required environment variable produced a non-empty value
/// - qBittorrent and tracker URLs use http(s)
/// - The tracker host is not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let missing: Vec<String> = REQUIRED_VARS
        .iter()
        .filter(|(_, field)| required_value(config, field).trim().is_empty())
        .map(|(var, _)| var.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ConfigError::MissingVariables(missing));
    }

    if !is_http_url(&config.qbittorrent.url) {
        return Err(ConfigError::ValidationError(format!(
            "QB_HOST must be an http(s) URL, got '{}'",
            config.qbittorrent.url
        )));
    }

    if !is_http_url(&config.tracker.api_url) {
        return Err(ConfigError::ValidationError(format!(
            "tracker.api_url must be an http(s) URL, got '{}'",
            config.tracker.api_url
        )));
    }

    if config.tracker.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.host cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn required_value<'a>(config: &'a Config, field: &str) -> &'a str {
    match field {
        "qbittorrent.url" => &config.qbittorrent.url,
        "qbittorrent.username" => &config.qbittorrent.username,
        "qbittorrent.password" => &config.qbittorrent.password,
        "tracker.api_key" => &config.tracker.api_key,
        _ => "",
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}
