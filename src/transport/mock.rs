//! transport::mock
//!
//! Mock transport for deterministic testing.
//!
//! # Design
//!
//! The mock transport stores documents in memory and allows configuring
//! per-path failures. Every request is recorded so tests can assert on
//! fetch ordering and counts. Clearing a staged failure makes the next
//! fetch succeed, which is how retryable-load tests are written.
//!
//! # Example
//!
//! ```
//! use proscenium::transport::{MockTransport, Transport, TransportError};
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new();
//! transport.stage("config.json", r#"{"useTransitions": true}"#);
//! transport.fail("flaky.json", TransportError::Network("timeout".into()));
//!
//! assert!(transport.fetch_text("config.json").await.is_ok());
//! assert!(transport.fetch_text("flaky.json").await.is_err());
//!
//! transport.clear_failure("flaky.json");
//! transport.stage("flaky.json", "recovered");
//! assert_eq!(transport.fetch_text("flaky.json").await.unwrap(), "recovered");
//!
//! assert_eq!(transport.requests().len(), 3);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use super::traits::{Transport, TransportError};

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockTransportInner {
    /// Staged documents by path.
    documents: HashMap<String, String>,
    /// Paths configured to fail, with the error to return.
    failures: HashMap<String, TransportError>,
    /// Recorded request paths, in order.
    requests: Vec<String>,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a text document at a path.
    pub fn stage(&self, path: impl Into<String>, body: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.documents.insert(path.into(), body.into());
    }

    /// Stage a JSON document at a path.
    pub fn stage_json(&self, path: impl Into<String>, value: &impl Serialize) {
        let body = serde_json::to_string(value).unwrap_or_default();
        self.stage(path, body);
    }

    /// Configure a path to fail with the given error.
    ///
    /// The failure persists across fetches until cleared, so retry behavior
    /// can be exercised.
    pub fn fail(&self, path: impl Into<String>, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert(path.into(), error);
    }

    /// Remove a configured failure. Returns `true` if one was present.
    pub fn clear_failure(&self, path: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.remove(path).is_some()
    }

    /// All recorded request paths, in order.
    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Number of requests made for a specific path.
    pub fn request_count(&self, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(path.to_string());

        if let Some(error) = inner.failures.get(path) {
            return Err(error.clone());
        }
        inner
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(path.to_string()))
    }
}
