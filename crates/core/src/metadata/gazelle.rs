//! GazelleGames API client.
//!
//! Every request carries the API key in the `X-API-Key` header. The tracker
//! asks clients to keep their request rate low, so each lookup is preceded
//! by a fixed pause.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::TrackerConfig;

use super::{MetadataError, MetadataProvider, ReleaseMetadata};

/// Fixed delay applied before each lookup, regardless of how long the
/// previous call took.
#[derive(Debug, Clone, Copy)]
pub struct RequestPacer {
    interval: Duration,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep for the configured interval.
    pub async fn wait(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// GazelleGames API client.
pub struct GazelleGamesClient {
    client: Client,
    api_url: String,
    api_key: String,
    pacer: RequestPacer,
}

impl GazelleGamesClient {
    /// Create a new GazelleGames client.
    pub fn new(config: TrackerConfig) -> Result<Self, MetadataError> {
        if config.api_key.trim().is_empty() {
            return Err(MetadataError::NotConfigured(
                "GazelleGames API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url,
            api_key: config.api_key,
            pacer: RequestPacer::new(Duration::from_millis(config.request_interval_ms)),
        })
    }

    /// GET the API endpoint with the given query parameters.
    async fn request(&self, params: &[(&str, &str)]) -> Result<(StatusCode, String), MetadataError> {
        let response = self
            .client
            .get(&self.api_url)
            .header("X-API-Key", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Common envelope: `{"status": "success"|"failure", "response": ..., "error": ...}`.
#[derive(Debug, Deserialize)]
struct GgnEnvelope {
    status: String,
    #[serde(default)]
    response: Value,
    #[serde(default)]
    error: Value,
}

impl GgnEnvelope {
    fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    fn error_message(&self) -> String {
        match &self.error {
            Value::String(s) => s.clone(),
            Value::Null => "unknown error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GgnTorrentResponse {
    group: GgnGroup,
    #[serde(default)]
    torrent: Option<GgnTorrent>,
}

#[derive(Debug, Deserialize)]
struct GgnGroup {
    #[serde(default)]
    name: String,
    /// Number or string depending on the endpoint version.
    #[serde(default)]
    year: Value,
    #[serde(default)]
    platform: String,
}

#[derive(Debug, Deserialize)]
struct GgnTorrent {
    #[serde(default, rename = "gameDOXType")]
    game_dox_type: String,
}

#[derive(Debug, Deserialize)]
struct GgnQuickUser {
    #[serde(default)]
    username: String,
}

fn parse_envelope(body: &str) -> Result<GgnEnvelope, MetadataError> {
    serde_json::from_str(body).map_err(|e| {
        MetadataError::ParseError(format!(
            "{}. Response: {}",
            e,
            body.chars().take(200).collect::<String>()
        ))
    })
}

fn year_to_string(year: &Value) -> Option<String> {
    match year {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Turn a `request=torrent` response body into metadata.
///
/// A `failure` status or an empty body means the tracker does not know
/// the hash.
fn parse_torrent_response(body: &str) -> Result<Option<ReleaseMetadata>, MetadataError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope = parse_envelope(body)?;
    if !envelope.is_success() {
        debug!("GazelleGames lookup failed: {}", envelope.error_message());
        return Ok(None);
    }

    let response: GgnTorrentResponse = serde_json::from_value(envelope.response)
        .map_err(|e| MetadataError::ParseError(format!("Failed to parse torrent response: {}", e)))?;

    let release_type = response
        .torrent
        .map(|t| t.game_dox_type.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(Some(ReleaseMetadata {
        manufacturer: None,
        platform: response.group.platform.trim().to_string(),
        title: response.group.name,
        year: year_to_string(&response.group.year),
        release_type,
    }))
}

#[async_trait]
impl MetadataProvider for GazelleGamesClient {
    fn name(&self) -> &str {
        "gazellegames"
    }

    async fn authenticate(&self) -> Result<(), MetadataError> {
        let (status, body) = self.request(&[("request", "quick_user")]).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MetadataError::AuthenticationFailed(
                "API key rejected".to_string(),
            ));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MetadataError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope = parse_envelope(&body)?;
        if !envelope.is_success() {
            return Err(MetadataError::AuthenticationFailed(envelope.error_message()));
        }

        let user: GgnQuickUser = serde_json::from_value(envelope.response).unwrap_or(GgnQuickUser {
            username: String::new(),
        });
        info!("Authenticated to GazelleGames as '{}'", user.username);
        Ok(())
    }

    async fn lookup_by_hash(&self, hash: &str) -> Result<Option<ReleaseMetadata>, MetadataError> {
        self.pacer.wait().await;

        // The API only accepts uppercase hashes
        let hash = hash.to_uppercase();
        debug!("GazelleGames lookup: hash={}", hash);

        let (status, body) = self
            .request(&[("request", "torrent"), ("hash", &hash)])
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MetadataError::AuthenticationFailed(
                "API key rejected".to_string(),
            ));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MetadataError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        parse_torrent_response(&body)
    }
}
