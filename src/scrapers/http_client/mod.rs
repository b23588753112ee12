//! HTTP client for game pages.

mod user_agent;

pub use user_agent::{resolve_user_agent, DEFAULT_USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Page, PageFetcher};

/// Headers sent with every page request.
const FIXED_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET"),
    ("access-control-allow-headers", "Content-Type"),
    ("access-control-max-age", "3600"),
];

/// Failure reaching a game page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("Unable to retrieve {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unable to retrieve {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unable to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Build the fixed header map sent with every request.
pub fn request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        );
    }
    headers
}

/// Plain GET client with the fixed header set and a request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: static Firefox user agent
    /// - Some("impersonate"): random real browser user agent
    /// - Some(custom): custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(request_headers())
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Build)?;

        Ok(Self { client })
    }

    /// Get page content as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!("GET {} -> {} in {:?}", url, status, start.elapsed());

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        match self.get_text(url).await {
            Ok(html) => Ok(Page::new(url, html)),
            Err(e) => {
                warn!("Unable to retrieve information from given URL: {}", url);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GAME_PATH: &str = "/game/0022200001/game-charts";

    #[test]
    fn test_request_headers_contains_fixed_set() {
        let headers = request_headers();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["access-control-max-age"], "3600");
    }

    #[tokio::test]
    async fn test_fetch_returns_page_and_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GAME_PATH))
            .and(header("access-control-allow-origin", "*"))
            .and(header("access-control-allow-methods", "GET"))
            .and(header("access-control-allow-headers", "Content-Type"))
            .and(header("access-control-max-age", "3600"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), GAME_PATH);
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let page = client.fetch(&url).await.unwrap();
        assert_eq!(page.url, url);
        assert_eq!(page.html, "<html><body>ok</body></html>");
    }

    #[tokio::test]
    async fn test_fetch_sends_custom_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "pbp-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpClient::with_user_agent(Duration::from_secs(5), Some("pbp-test/1.0")).unwrap();
        let page = client.fetch(&format!("{}{}", server.uri(), GAME_PATH)).await.unwrap();
        assert_eq!(page.html, "ok");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GAME_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .fetch(&format!("{}{}", server.uri(), GAME_PATH))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let client = HttpClient::new(Duration::from_secs(2)).unwrap();
        let err = client.fetch(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
