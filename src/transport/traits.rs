//! transport::traits
//!
//! Transport trait definition for fetching remote documents.
//!
//! # Design
//!
//! The `Transport` trait is async because document fetching involves I/O.
//! All methods return `Result` so callers can distinguish a missing document
//! from a transport failure; fragment loading treats both as retryable.
//!
//! # Example
//!
//! ```
//! use proscenium::transport::{fetch_json, MockTransport, Transport};
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new();
//! transport.stage("pages/index.json", r#"[{"path": "home.json", "name": "home"}]"#);
//!
//! let text = transport.fetch_text("pages/index.json").await.unwrap();
//! assert!(text.contains("home"));
//!
//! let entries: Vec<serde_json::Value> =
//!     fetch_json(&transport, "pages/index.json").await.unwrap();
//! assert_eq!(entries.len(), 1);
//! # });
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The document does not exist at the given path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote answered with a non-success status.
    #[error("fetch failed for '{path}': status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested path.
        path: String,
    },

    /// Network, connection, or I/O error.
    #[error("network error: {0}")]
    Network(String),

    /// The document was fetched but could not be decoded.
    #[error("invalid document at '{path}': {message}")]
    Decode {
        /// The requested path.
        path: String,
        /// Decoder error message.
        message: String,
    },
}

/// The Transport trait for fetching documents by path.
///
/// Paths are transport-relative (`pages/index.json`); each implementation
/// decides how to resolve them. Implementations must be `Send + Sync` so
/// loads can run as spawned tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The transport name (e.g. "http", "dir", "mock").
    fn name(&self) -> &'static str;

    /// Fetch a document as text.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no document at the path
    /// - `Status` for other non-success responses
    /// - `Network` for connection and I/O failures
    async fn fetch_text(&self, path: &str) -> Result<String, TransportError>;
}

/// Fetch a document and decode it as JSON.
///
/// # Errors
///
/// Fetch errors pass through; a document that fetches but does not decode
/// yields [`TransportError::Decode`].
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    path: &str,
) -> Result<T, TransportError> {
    let text = transport.fetch_text(path).await?;
    serde_json::from_str(&text).map_err(|e| TransportError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        assert_eq!(
            format!("{}", TransportError::NotFound("pages/home.json".into())),
            "not found: pages/home.json"
        );
        assert_eq!(
            format!(
                "{}",
                TransportError::Status {
                    status: 503,
                    path: "config.json".into()
                }
            ),
            "fetch failed for 'config.json': status 503"
        );
        assert_eq!(
            format!("{}", TransportError::Network("connection refused".into())),
            "network error: connection refused"
        );
        assert_eq!(
            format!(
                "{}",
                TransportError::Decode {
                    path: "index.json".into(),
                    message: "expected value".into()
                }
            ),
            "invalid document at 'index.json': expected value"
        );
    }

    #[tokio::test]
    async fn fetch_json_decodes() {
        let transport = super::super::MockTransport::new();
        transport.stage("config.json", r#"{"useTransitions": true}"#);

        let value: serde_json::Value = fetch_json(&transport, "config.json").await.unwrap();
        assert_eq!(value["useTransitions"], serde_json::Value::Bool(true));
    }

    #[tokio::test]
    async fn fetch_json_reports_decode_failure() {
        let transport = super::super::MockTransport::new();
        transport.stage("broken.json", "{not json");

        let result: Result<serde_json::Value, _> = fetch_json(&transport, "broken.json").await;
        assert!(matches!(result, Err(TransportError::Decode { .. })));
    }
}
