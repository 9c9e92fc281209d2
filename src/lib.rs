//! Proscenium - a declarative application shell runtime
//!
//! Proscenium turns a declarative document tree into a running application
//! composed of reusable modules and navigable pages, loaded on demand over
//! a transport seam and swapped in and out through a choreographed
//! state-tag transition.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line layer for the `prosc` binary (parses args,
//!   delegates to the shell)
//! - [`shell`] - The application shell: configuration resolution, manifest
//!   bootstrap, and the navigation engine
//! - [`fragment`] - Fragments (modules/pages), lazy template loading, and
//!   instancing
//! - [`core`] - Domain vocabulary, the configuration map, and the fragment
//!   registry
//! - [`dom`] - The addressable node tree the shell drives
//! - [`transport`] - Document fetching (HTTP, local directory, mock)
//!
//! # Correctness Invariants
//!
//! 1. At most one page instance is current at any time; the previous
//!    instance exists only while a transition is in flight
//! 2. Registry names are unique; iteration order is insertion order
//! 3. The configuration map is rebuilt from scratch on every resolution
//!    pass, and passes never overlap
//! 4. Each transition step is committed through a barrier before the next
//!    mutation batch runs

pub mod cli;
pub mod core;
pub mod dom;
pub mod fragment;
pub mod shell;
pub mod transport;
