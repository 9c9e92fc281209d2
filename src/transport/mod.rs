//! transport
//!
//! Document fetching abstraction.
//!
//! # Design
//!
//! Everything the shell loads — external configuration documents, directory
//! manifests, fragment sources — arrives through the [`Transport`] trait.
//! Three implementations are provided:
//!
//! - [`HttpTransport`]: fetches over HTTP via `reqwest`, resolving relative
//!   paths against a base URL.
//! - [`DirTransport`]: serves documents from a local directory; used by the
//!   `prosc` binary for local development.
//! - [`MockTransport`]: scripted in-memory responses with failure injection
//!   and request recording, for deterministic tests.
//!
//! Transports are invoked concurrently (configuration files within a group
//! are fetched jointly) and must be `Send + Sync`.

pub mod dir;
pub mod http;
pub mod mock;
pub mod traits;

pub use dir::DirTransport;
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use traits::{fetch_json, Transport, TransportError};
