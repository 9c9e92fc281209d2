//! transport::dir
//!
//! Directory-backed transport for local documents.
//!
//! Serves documents from a root directory on disk; `pages/home.json`
//! resolves to `<root>/pages/home.json`. Used by the `prosc` binary so an
//! application can be developed without a server. Paths that would escape
//! the root (absolute paths, `..` components) are treated as absent.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::traits::{Transport, TransportError};

/// Local-directory transport.
#[derive(Debug, Clone)]
pub struct DirTransport {
    /// Directory all paths resolve under.
    root: PathBuf,
}

impl DirTransport {
    /// Create a transport serving documents under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a document path, rejecting escapes from the root.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return None;
        }
        let mut resolved = self.root.clone();
        for component in candidate.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }
}

#[async_trait]
impl Transport for DirTransport {
    fn name(&self) -> &'static str {
        "dir"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, TransportError> {
        let Some(resolved) = self.resolve(path) else {
            return Err(TransportError::NotFound(path.to_string()));
        };
        match tokio::fs::read_to_string(&resolved).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TransportError::NotFound(path.to_string()))
            }
            Err(e) => Err(TransportError::Network(e.to_string())),
        }
    }
}
