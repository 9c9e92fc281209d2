//! dom
//!
//! The addressable node tree the shell drives.
//!
//! # Design
//!
//! The runtime does not parse markup. Documents (the application document
//! and fragment sources) are serde-encoded node trees (see [`NodeSpec`]),
//! and the live tree is a graph of [`Node`] handles with ordered children,
//! string attributes, and weak parent links.
//!
//! [`Node`] is a cheap clonable handle (`Arc` internally); two handles may
//! refer to the same underlying node, so identity comparisons go through
//! [`Node::same_node`] (also exposed as `PartialEq`), never through
//! structural equality.
//!
//! # Invariants
//!
//! - A node has at most one parent; attaching a node elsewhere detaches it
//!   from its old position first.
//! - A node can never become its own ancestor ([`DomError::Cycle`]).
//! - `find_all` yields descendants in document order (pre-order).

pub mod node;
pub mod spec;

pub use node::{DomError, Node};
pub use spec::NodeSpec;
