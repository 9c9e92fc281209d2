//! transport::http
//!
//! HTTP transport implementation using `reqwest`.
//!
//! # Design
//!
//! Relative paths are resolved against a base URL; absolute `http(s)://`
//! paths pass through untouched. Response statuses map onto the transport
//! error taxonomy: 404 becomes `NotFound`, other non-success statuses become
//! `Status`, connection failures become `Network`.
//!
//! Retry is the caller's responsibility. Fragment loads are individually
//! retryable, and the shell treats a failed configuration fetch as a fatal
//! bootstrap error, so the transport itself stays policy-free.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::traits::{Transport, TransportError};

/// User-Agent header value for document requests.
const USER_AGENT_VALUE: &str = "proscenium";

/// HTTP transport.
///
/// # Example
///
/// ```no_run
/// use proscenium::transport::HttpTransport;
///
/// let transport = HttpTransport::new("https://apps.example.com/demo");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client for making requests.
    client: Client,
    /// Base URL for relative paths, without a trailing slash.
    base: String,
}

impl HttpTransport {
    /// Create a transport resolving relative paths against `base`.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            client: Client::new(),
            base,
        }
    }

    /// The configured base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve a path to a full URL.
    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base, path.trim_start_matches('/'))
        }
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, TransportError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .headers(Self::default_headers())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(TransportError::NotFound(path.to_string())),
            status if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            }),
            _ => response
                .text()
                .await
                .map_err(|e| TransportError::Network(e.to_string())),
        }
    }
}
