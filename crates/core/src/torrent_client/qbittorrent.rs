//! qBittorrent Web API v2 client.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{CategoryCreation, TorrentClient, TorrentClientError, TorrentInfo, TrackerEntry};

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once a login succeeded; the cookie jar holds the actual SID.
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim().trim_end_matches('/')
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url(), endpoint)
    }

    /// Login and store session cookie.
    async fn authenticate(&self) -> Result<(), TorrentClientError> {
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.url("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        login_result(status, &body)?;
        debug!("qBittorrent login successful");
        let mut session = self.session.write().await;
        *session = Some("authenticated".to_string());
        Ok(())
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.authenticate().await
    }

    /// Send an authenticated request, re-logging in once on HTTP 403.
    ///
    /// Returns the status alongside the body so callers can interpret
    /// endpoint-specific codes such as 409.
    async fn execute<F>(&self, build: F) -> Result<(StatusCode, String), TorrentClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let mut response = build().send().await.map_err(map_request_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.authenticate().await?;
            response = build().send().await.map_err(map_request_error)?;
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))?;

        if status == StatusCode::CONFLICT {
            return Ok((status, body));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        Ok((status, body))
    }

    /// GET an endpoint and return the body of a successful response.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        let url = self.url(endpoint);
        let (status, body) = self.execute(|| self.client.get(&url)).await?;
        if status == StatusCode::CONFLICT {
            return Err(TorrentClientError::Conflict(body));
        }
        Ok(body)
    }

    /// POST form data and return the status and body.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<(StatusCode, String), TorrentClientError> {
        let url = self.url(endpoint);
        self.execute(|| self.client.post(&url).form(params)).await
    }
}

/// Map a transport failure onto the client error taxonomy.
fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Interpret the `/auth/login` reply: `Ok.` on success, `Fails.` or 403 on
/// bad credentials or a banned IP.
fn login_result(status: StatusCode, body: &str) -> Result<(), TorrentClientError> {
    if status.is_success() && body.contains("Ok.") {
        Ok(())
    } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
        Err(TorrentClientError::AuthenticationFailed(
            "Invalid credentials".to_string(),
        ))
    } else {
        Err(TorrentClientError::AuthenticationFailed(format!(
            "Unexpected response ({}): {}",
            status,
            body.chars().take(100).collect::<String>()
        )))
    }
}

/// `createCategory` answers 409 when the category already exists.
fn category_creation(status: StatusCode) -> CategoryCreation {
    if status == StatusCode::CONFLICT {
        CategoryCreation::AlreadyExisted
    } else {
        CategoryCreation::Created
    }
}

/// `setCategory` answers 409 when the category does not exist.
fn category_assignment(status: StatusCode, category: &str) -> Result<(), TorrentClientError> {
    if status == StatusCode::CONFLICT {
        Err(TorrentClientError::CategoryMissing(category.to_string()))
    } else {
        Ok(())
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    /// Comma separated, e.g. "GGn-Sorted, games".
    #[serde(default)]
    tags: String,
    /// Current working tracker; empty when none is reachable.
    #[serde(default)]
    tracker: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            category: non_empty(self.category),
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            tracker: non_empty(self.tracker),
        }
    }
}

/// qBittorrent tracker entry response.
#[derive(Debug, Deserialize)]
struct QBTracker {
    url: String,
    #[serde(default)]
    msg: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn login(&self) -> Result<(), TorrentClientError> {
        self.authenticate().await
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(torrents.into_iter().map(|t| t.into_torrent_info()).collect())
    }

    async fn get_trackers(&self, hash: &str) -> Result<Vec<TrackerEntry>, TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let endpoint = format!(
            "/api/v2/torrents/trackers?hash={}",
            urlencoding::encode(&hash_lower)
        );
        let response = self.get(&endpoint).await?;
        let trackers: Vec<QBTracker> = serde_json::from_str(&response)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(trackers
            .into_iter()
            .map(|t| TrackerEntry {
                url: t.url,
                message: t.msg,
            })
            .collect())
    }

    async fn get_categories(&self) -> Result<Vec<String>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/categories").await?;
        let categories: BTreeMap<String, serde_json::Value> = serde_json::from_str(&response)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(categories.into_keys().collect())
    }

    async fn create_category(&self, name: &str) -> Result<CategoryCreation, TorrentClientError> {
        let (status, _) = self
            .post_form(
                "/api/v2/torrents/createCategory",
                &[("category", name), ("savePath", "")],
            )
            .await?;

        let creation = category_creation(status);
        if creation == CategoryCreation::AlreadyExisted {
            debug!("Category '{}' already exists", name);
        }
        Ok(creation)
    }

    async fn set_category(&self, hash: &str, category: &str) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let (status, _) = self
            .post_form(
                "/api/v2/torrents/setCategory",
                &[("hashes", &hash_lower), ("category", category)],
            )
            .await?;

        category_assignment(status, category)
    }

    async fn add_tags(&self, hash: &str, tags: &[&str]) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let tags = tags.join(",");
        let (status, body) = self
            .post_form(
                "/api/v2/torrents/addTags",
                &[("hashes", &hash_lower), ("tags", &tags)],
            )
            .await?;

        if status == StatusCode::CONFLICT {
            return Err(TorrentClientError::Conflict(body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> QBittorrentConfig {
        QBittorrentConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let client = QBittorrentClient::new(config("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.url("/api/v2/torrents/info"),
            "http://localhost:8080/api/v2/torrents/info"
        );
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let json = r#"[{
            "hash": "ABC123",
            "name": "Super Mario Odyssey",
            "category": "",
            "tags": "GGn-Sorted, games",
            "tracker": "https://tracker.gazellegames.net/announce",
            "state": "uploading",
            "progress": 1.0
        }]"#;

        let parsed: Vec<QBTorrentInfo> = serde_json::from_str(json).unwrap();
        let info = parsed.into_iter().next().unwrap().into_torrent_info();

        assert_eq!(info.hash, "abc123"); // lowercase
        assert_eq!(info.name, "Super Mario Odyssey");
        assert_eq!(info.category, None);
        assert_eq!(info.tags, vec!["GGn-Sorted", "games"]);
        assert_eq!(
            info.tracker.as_deref(),
            Some("https://tracker.gazellegames.net/announce")
        );
    }

    #[test]
    fn test_qb_torrent_info_missing_optional_fields() {
        let json = r#"{"hash": "def456"}"#;
        let parsed: QBTorrentInfo = serde_json::from_str(json).unwrap();
        let info = parsed.into_torrent_info();

        assert_eq!(info.hash, "def456");
        assert!(info.category.is_none());
        assert!(info.tags.is_empty());
        assert!(info.tracker.is_none());
    }

    #[test]
    fn test_qb_tracker_parsing() {
        let json = r#"[
            {"url": "** [DHT] **", "status": 0, "msg": ""},
            {"url": "https://tracker.gazellegames.net/announce", "status": 2, "msg": "Working"}
        ]"#;
        let trackers: Vec<QBTracker> = serde_json::from_str(json).unwrap();
        assert_eq!(trackers.len(), 2);
        assert_eq!(trackers[1].msg, "Working");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("Games".to_string()), Some("Games".to_string()));
    }

    #[test]
    fn test_login_result() {
        assert!(login_result(StatusCode::OK, "Ok.").is_ok());
        assert!(matches!(
            login_result(StatusCode::OK, "Fails."),
            Err(TorrentClientError::AuthenticationFailed(m)) if m == "Invalid credentials"
        ));
        assert!(matches!(
            login_result(StatusCode::FORBIDDEN, "Your IP address has been banned"),
            Err(TorrentClientError::AuthenticationFailed(m)) if m == "Invalid credentials"
        ));
        assert!(matches!(
            login_result(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            Err(TorrentClientError::AuthenticationFailed(m)) if m.contains("500")
        ));
    }

    #[test]
    fn test_create_category_conflict_means_already_existed() {
        assert_eq!(category_creation(StatusCode::OK), CategoryCreation::Created);
        assert_eq!(
            category_creation(StatusCode::CONFLICT),
            CategoryCreation::AlreadyExisted
        );
    }

    #[test]
    fn test_set_category_conflict_means_missing() {
        assert_eq!(category_assignment(StatusCode::OK, "Sony/PS4"), Ok(()));
        assert_eq!(
            category_assignment(StatusCode::CONFLICT, "Sony/PS4"),
            Err(TorrentClientError::CategoryMissing("Sony/PS4".to_string()))
        );
    }

    mod http {
        use super::*;
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::sync::Mutex;

        /// Local server answering each connection with the next canned
        /// `(status, body)` and recording the raw requests.
        struct CannedServer {
            url: String,
            requests: Arc<Mutex<Vec<String>>>,
        }

        impl CannedServer {
            async fn start(responses: Vec<(u16, &'static str)>) -> Self {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let url = format!("http://{}", listener.local_addr().unwrap());
                let requests = Arc::new(Mutex::new(Vec::new()));
                let recorded = Arc::clone(&requests);

                tokio::spawn(async move {
                    for (status, body) in responses {
                        let Ok((mut stream, _)) = listener.accept().await else {
                            return;
                        };
                        let request = read_request(&mut stream).await;
                        recorded.lock().await.push(request);
                        let response = format!(
                            "HTTP/1.1 {} Canned\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                });

                Self { url, requests }
            }

            /// Request lines (`POST /api/v2/auth/login HTTP/1.1`) in order.
            async fn request_lines(&self) -> Vec<String> {
                self.requests
                    .lock()
                    .await
                    .iter()
                    .map(|r| r.lines().next().unwrap_or_default().to_string())
                    .collect()
            }

            async fn request(&self, index: usize) -> String {
                self.requests.lock().await[index].clone()
            }
        }

        async fn read_request(stream: &mut TcpStream) -> String {
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&data);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if data.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            String::from_utf8_lossy(&data).into_owned()
        }

        #[tokio::test]
        async fn test_login_ok() {
            let server = CannedServer::start(vec![(200, "Ok.")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            client.login().await.unwrap();

            assert_eq!(
                server.request_lines().await,
                vec!["POST /api/v2/auth/login HTTP/1.1"]
            );
            let request = server.request(0).await;
            assert!(request.contains("username=admin"), "{}", request);
            assert!(request.contains("password=adminadmin"), "{}", request);
        }

        #[tokio::test]
        async fn test_login_fails() {
            let server = CannedServer::start(vec![(200, "Fails.")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let result = client.login().await;
            assert!(matches!(result, Err(TorrentClientError::AuthenticationFailed(_))));
        }

        #[tokio::test]
        async fn test_login_forbidden() {
            let server = CannedServer::start(vec![(403, "Forbidden")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let result = client.login().await;
            assert!(matches!(result, Err(TorrentClientError::AuthenticationFailed(_))));
        }

        #[tokio::test]
        async fn test_create_category_conflict_is_already_existed() {
            let server = CannedServer::start(vec![(200, "Ok."), (409, "")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let creation = client
                .create_category("Nintendo/Nintendo Switch/Hades (2020)")
                .await
                .unwrap();

            assert_eq!(creation, CategoryCreation::AlreadyExisted);
            assert_eq!(
                server.request_lines().await,
                vec![
                    "POST /api/v2/auth/login HTTP/1.1",
                    "POST /api/v2/torrents/createCategory HTTP/1.1",
                ]
            );
            let request = server.request(1).await;
            assert!(
                request.contains("category=Nintendo%2FNintendo+Switch%2FHades+%282020%29"),
                "{}",
                request
            );
        }

        #[tokio::test]
        async fn test_create_category_created() {
            let server = CannedServer::start(vec![(200, "Ok."), (200, "")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let creation = client.create_category("Sony/PlayStation 4/Bloodborne (2015)").await;
            assert_eq!(creation, Ok(CategoryCreation::Created));
        }

        #[tokio::test]
        async fn test_set_category_conflict_is_category_missing() {
            let server = CannedServer::start(vec![(200, "Ok."), (409, "")]).await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let result = client.set_category("ABCDEF", "Microsoft/Windows/Doom").await;

            assert_eq!(
                result,
                Err(TorrentClientError::CategoryMissing(
                    "Microsoft/Windows/Doom".to_string()
                ))
            );
            let request = server.request(1).await;
            assert!(request.contains("hashes=abcdef"), "{}", request);
        }

        #[tokio::test]
        async fn test_expired_session_relogs_in_once() {
            let server = CannedServer::start(vec![
                (200, "Ok."),
                (403, "Forbidden"),
                (200, "Ok."),
                (200, r#"{"Games": {"name": "Games", "savePath": ""}}"#),
            ])
            .await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let categories = client.get_categories().await.unwrap();

            assert_eq!(categories, vec!["Games"]);
            assert_eq!(
                server.request_lines().await,
                vec![
                    "POST /api/v2/auth/login HTTP/1.1",
                    "GET /api/v2/torrents/categories HTTP/1.1",
                    "POST /api/v2/auth/login HTTP/1.1",
                    "GET /api/v2/torrents/categories HTTP/1.1",
                ]
            );
        }

        #[tokio::test]
        async fn test_second_forbidden_is_an_error() {
            let server = CannedServer::start(vec![
                (200, "Ok."),
                (403, "Forbidden"),
                (200, "Ok."),
                (403, "Forbidden"),
            ])
            .await;
            let client = QBittorrentClient::new(config(&server.url)).unwrap();

            let result = client.get_categories().await;

            assert!(matches!(result, Err(TorrentClientError::ApiError(_))));
            assert_eq!(server.request_lines().await.len(), 4);
        }
    }
}
