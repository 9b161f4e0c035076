//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building per-worker HTTP clients routed through the configured proxy
//! - GET requests to fetch page content
//! - Error classification into [`FetchError`]
//!
//! Fetch failures are never retried; the traversal logs them and moves on to
//! the next sibling.

use crate::config::NetworkConfig;
use crate::url::Address;
use crate::BurrowError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value, `"unknown"` when absent
    pub content_type: String,
    /// Page body content
    pub body: String,
}

/// Why a fetch produced no page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// One worker's network session
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one address
    async fn fetch(&self, address: &Address) -> Result<FetchedPage, FetchError>;
}

/// Opens a fresh fetch session for each worker
///
/// Sessions are never shared, so connection reuse and cookie state stay
/// private to the worker that owns them.
pub trait SessionFactory: Send + Sync {
    fn open_session(&self, worker: &str) -> Result<Box<dyn Fetcher>, BurrowError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use burrow::config::NetworkConfig;
/// use burrow::crawler::build_http_client;
///
/// let config = NetworkConfig {
///     proxy: Some("socks5h://127.0.0.1:9050".to_string()),
///     ..NetworkConfig::default()
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &NetworkConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(30)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// reqwest-backed fetcher owning its own client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, address: &Address) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(address.as_str())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Maps a reqwest send error onto the fetch failure taxonomy
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

/// Builds a new [`HttpFetcher`] per worker from the network settings
pub struct HttpSessionFactory {
    network: NetworkConfig,
}

impl HttpSessionFactory {
    pub fn new(network: NetworkConfig) -> Self {
        Self { network }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open_session(&self, worker: &str) -> Result<Box<dyn Fetcher>, BurrowError> {
        let client = build_http_client(&self.network)?;
        tracing::debug!(
            worker,
            proxy = self.network.proxy.as_deref().unwrap_or("none"),
            "Opened fetch session"
        );
        Ok(Box::new(HttpFetcher::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::NormalizePolicy;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn address(raw: &str) -> Address {
        Address::new(raw, NormalizePolicy::default()).unwrap()
    }

    fn test_network() -> NetworkConfig {
        NetworkConfig {
            proxy: None,
            user_agent: "TestCrawler/1.0".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&test_network()).is_ok());
    }

    #[test]
    fn test_build_client_with_socks_proxy() {
        let config = NetworkConfig {
            proxy: Some("socks5h://127.0.0.1:9050".to_string()),
            ..test_network()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_factory_opens_independent_sessions() {
        let factory = HttpSessionFactory::new(test_network());
        assert!(factory.open_session("worker-1").is_ok());
        assert!(factory.open_session("worker-2").is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><title>Hi</title></html>")
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_http_client(&test_network()).unwrap());
        let page = fetcher
            .fetch(&address(&format!("{}/", server.uri())))
            .await
            .unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.content_type, "text/html; charset=utf-8");
        assert!(page.body.contains("<title>Hi</title>"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"plain".to_vec()))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_http_client(&test_network()).unwrap());
        let page = fetcher
            .fetch(&address(&format!("{}/raw", server.uri())))
            .await
            .unwrap();

        assert_eq!(page.content_type, "unknown");
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_http_client(&test_network()).unwrap());
        let result = fetcher
            .fetch(&address(&format!("{}/missing", server.uri())))
            .await;

        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_timeout_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = NetworkConfig {
            timeout_secs: 1,
            ..test_network()
        };
        let fetcher = HttpFetcher::new(build_http_client(&config).unwrap());
        let result = fetcher
            .fetch(&address(&format!("{}/slow", server.uri())))
            .await;

        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop a listener so the port is known to be closed
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let fetcher = HttpFetcher::new(build_http_client(&test_network()).unwrap());
        let result = fetcher
            .fetch(&address(&format!("http://127.0.0.1:{}/", port)))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::Connect(_)) | Err(FetchError::Transport(_))
        ));
    }
}
