//! dom::node
//!
//! Shared-handle node type for the declarative tree.
//!
//! # Design
//!
//! A [`Node`] wraps its state in `Arc<Mutex<..>>` so the shell, fragments,
//! and spawned loader tasks can all hold handles to the same tree. Locks are
//! held only for the duration of a single operation and never across an
//! await point.
//!
//! Attributes are kept in insertion order. Children are ordered; sibling
//! positioning (`insert_after`) is what the navigation engine uses to place
//! an incoming page next to the outgoing one.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;

/// Errors from tree mutations and document decoding.
#[derive(Debug, Error)]
pub enum DomError {
    /// The operation requires the node to be attached to a parent.
    #[error("node <{0}> has no parent")]
    Detached(String),

    /// Attaching here would make the node its own ancestor.
    #[error("node <{0}> cannot contain itself or one of its ancestors")]
    Cycle(String),

    /// A serialized document could not be decoded into a node tree.
    #[error("invalid document: {0}")]
    Decode(String),
}

/// Internal node state.
#[derive(Debug)]
struct NodeInner {
    /// Element tag, e.g. `page` or `config-file`.
    tag: String,
    /// Attributes in insertion order.
    attrs: Vec<(String, String)>,
    /// Optional text payload.
    text: Option<String>,
    /// Ordered children.
    children: Vec<Node>,
    /// Weak link to the parent; empty when detached.
    parent: Weak<Mutex<NodeInner>>,
}

/// A node in the declarative tree.
///
/// Cloning a `Node` clones the handle, not the subtree; use
/// [`Node::deep_clone`] for an independent copy.
#[derive(Debug, Clone)]
pub struct Node {
    inner: Arc<Mutex<NodeInner>>,
}

impl Node {
    /// Create a detached node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NodeInner {
                tag: tag.into(),
                attrs: Vec::new(),
                text: None,
                children: Vec::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// The node's tag.
    pub fn tag(&self) -> String {
        self.inner.lock().unwrap().tag.clone()
    }

    /// Whether two handles refer to the same underlying node.
    pub fn same_node(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Attributes and text
    // =========================================================================

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Whether the attribute is present (regardless of value).
    pub fn has_attribute(&self, name: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut inner = self.inner.lock().unwrap();
        if let Some(slot) = inner.attrs.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            inner.attrs.push((name, value));
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.attrs.len();
        inner.attrs.retain(|(k, _)| k != name);
        inner.attrs.len() != before
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().attrs.clone()
    }

    /// The node's text payload, if any.
    pub fn text(&self) -> Option<String> {
        self.inner.lock().unwrap().text.clone()
    }

    /// Set or clear the text payload.
    pub fn set_text(&self, text: Option<String>) {
        self.inner.lock().unwrap().text = text;
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The parent node, if attached.
    pub fn parent(&self) -> Option<Node> {
        let inner = self.inner.lock().unwrap();
        inner.parent.upgrade().map(|arc| Node { inner: arc })
    }

    /// Snapshot of the node's children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.inner.lock().unwrap().children.clone()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.inner.lock().unwrap().children.len()
    }

    /// Append `child` as the last child, detaching it from any previous
    /// parent first.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Cycle`] if `child` is this node or one of its
    /// ancestors.
    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.guard_cycle(child)?;
        child.detach();
        {
            let mut inner = self.inner.lock().unwrap();
            inner.children.push(child.clone());
        }
        child.set_parent(self);
        Ok(())
    }

    /// Insert `sibling` immediately after this node, detaching it from any
    /// previous parent first.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Detached`] if this node has no parent, or
    /// [`DomError::Cycle`] if the insertion would create a cycle.
    pub fn insert_after(&self, sibling: &Node) -> Result<(), DomError> {
        let parent = self
            .parent()
            .ok_or_else(|| DomError::Detached(self.tag()))?;
        parent.guard_cycle(sibling)?;
        sibling.detach();
        {
            let mut inner = parent.inner.lock().unwrap();
            let index = inner
                .children
                .iter()
                .position(|c| c.same_node(self))
                // The parent link was just read; self must be in the list.
                .unwrap_or(inner.children.len());
            let at = (index + 1).min(inner.children.len());
            inner.children.insert(at, sibling.clone());
        }
        sibling.set_parent(&parent);
        Ok(())
    }

    /// Detach this node from its parent. Returns `true` if it was attached.
    pub fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        {
            let mut inner = parent.inner.lock().unwrap();
            inner.children.retain(|c| !c.same_node(self));
        }
        self.inner.lock().unwrap().parent = Weak::new();
        true
    }

    /// Deep, fully independent copy of this subtree.
    ///
    /// The copy is detached; mutating it never affects the original or any
    /// other copy.
    pub fn deep_clone(&self) -> Node {
        let (tag, attrs, text, children) = {
            let inner = self.inner.lock().unwrap();
            (
                inner.tag.clone(),
                inner.attrs.clone(),
                inner.text.clone(),
                inner.children.clone(),
            )
        };
        let copy = Node::new(tag);
        {
            let mut copy_inner = copy.inner.lock().unwrap();
            copy_inner.attrs = attrs;
            copy_inner.text = text;
        }
        for child in children {
            copy.push_child_unchecked(&child.deep_clone());
        }
        copy
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All descendants with the given tag, in document order (pre-order).
    ///
    /// The node itself is not included.
    pub fn find_all(&self, tag: &str) -> Vec<Node> {
        let mut out = Vec::new();
        self.collect_tagged(tag, &mut out);
        out
    }

    /// The first descendant with the given tag, in document order.
    pub fn find_first(&self, tag: &str) -> Option<Node> {
        for child in self.children() {
            if child.tag() == tag {
                return Some(child);
            }
            if let Some(found) = child.find_first(tag) {
                return Some(found);
            }
        }
        None
    }

    fn collect_tagged(&self, tag: &str, out: &mut Vec<Node>) {
        for child in self.children() {
            if child.tag() == tag {
                out.push(child.clone());
            }
            child.collect_tagged(tag, out);
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Append without cycle/parent handling. Only valid for freshly built
    /// detached subtrees (deep_clone, spec decoding).
    pub(crate) fn push_child_unchecked(&self, child: &Node) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.children.push(child.clone());
        }
        child.set_parent(self);
    }

    fn set_parent(&self, parent: &Node) {
        self.inner.lock().unwrap().parent = Arc::downgrade(&parent.inner);
    }

    fn guard_cycle(&self, candidate: &Node) -> Result<(), DomError> {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node.same_node(candidate) {
                return Err(DomError::Cycle(candidate.tag()));
            }
            cursor = node.parent();
        }
        Ok(())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(f, "{}<{}", pad, self.tag())?;
        for (name, value) in self.attributes() {
            if value.is_empty() {
                write!(f, " {}", name)?;
            } else {
                write!(f, " {}=\"{}\"", name, value)?;
            }
        }
        writeln!(f, ">")?;
        if let Some(text) = self.text() {
            writeln!(f, "{}  {}", pad, text)?;
        }
        for child in self.children() {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
