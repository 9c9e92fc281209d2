//! dom::spec
//!
//! Serde bridge between serialized documents and the live tree.
//!
//! # Design
//!
//! Fragment sources and application documents travel as JSON-encoded
//! [`NodeSpec`] trees. Decoding builds detached [`Node`] subtrees; encoding
//! snapshots a live subtree back into plain data (used by the CLI's `--json`
//! output and by tests asserting on tree shapes).
//!
//! # Example
//!
//! ```
//! use proscenium::dom::{Node, NodeSpec};
//!
//! let spec = NodeSpec::from_json(
//!     r#"{"tag": "page", "attrs": {"name": "home"},
//!         "children": [{"tag": "body", "text": "Welcome"}]}"#,
//! )
//! .unwrap();
//! let node = Node::from_spec(&spec);
//!
//! assert_eq!(node.attribute("name").as_deref(), Some("home"));
//! assert_eq!(node.to_spec(), spec);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::{DomError, Node};

/// Plain-data form of a node subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Element tag.
    pub tag: String,

    /// Attributes. Serialized as a sorted map; attribute order is not part
    /// of the document contract.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Optional text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Create a childless spec with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Decode a spec from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Decode`] when the document is not a valid
    /// node tree.
    pub fn from_json(text: &str) -> Result<Self, DomError> {
        serde_json::from_str(text).map_err(|e| DomError::Decode(e.to_string()))
    }

    /// Encode the spec as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        // A NodeSpec contains only maps, strings, and sequences; encoding
        // cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Node {
    /// Build a detached live subtree from a spec.
    pub fn from_spec(spec: &NodeSpec) -> Node {
        let node = Node::new(spec.tag.clone());
        for (name, value) in &spec.attrs {
            node.set_attribute(name.clone(), value.clone());
        }
        node.set_text(spec.text.clone());
        for child in &spec.children {
            node.push_child_unchecked(&Node::from_spec(child));
        }
        node
    }

    /// Snapshot this subtree as plain data.
    pub fn to_spec(&self) -> NodeSpec {
        NodeSpec {
            tag: self.tag(),
            attrs: self.attributes().into_iter().collect(),
            text: self.text(),
            children: self.children().iter().map(Node::to_spec).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_minimal_document() {
        let spec = NodeSpec::from_json(r#"{"tag": "app"}"#).unwrap();
        assert_eq!(spec.tag, "app");
        assert!(spec.attrs.is_empty());
        assert!(spec.children.is_empty());
    }

    #[test]
    fn decode_rejects_unknown_fields() {
        let result = NodeSpec::from_json(r#"{"tag": "app", "bogus": 1}"#);
        assert!(matches!(result, Err(DomError::Decode(_))));
    }

    #[test]
    fn decode_rejects_non_tree_documents() {
        assert!(NodeSpec::from_json("[1, 2, 3]").is_err());
        assert!(NodeSpec::from_json("not json").is_err());
    }

    #[test]
    fn round_trip_preserves_structure() {
        let text = r#"{
            "tag": "page",
            "attrs": {"name": "home"},
            "children": [
                {"tag": "head", "children": [{"tag": "title", "text": "Home"}]},
                {"tag": "body", "children": [{"tag": "section", "attrs": {"id": "hero"}}]}
            ]
        }"#;
        let spec = NodeSpec::from_json(text).unwrap();
        let node = Node::from_spec(&spec);

        assert_eq!(node.children().len(), 2);
        let title = node.find_first("title").unwrap();
        assert_eq!(title.text().as_deref(), Some("Home"));

        assert_eq!(node.to_spec(), spec);
    }

    #[test]
    fn from_spec_builds_parent_links() {
        let spec = NodeSpec::from_json(
            r#"{"tag": "body", "children": [{"tag": "section"}]}"#,
        )
        .unwrap();
        let node = Node::from_spec(&spec);
        let section = node.find_first("section").unwrap();
        assert!(section.parent().unwrap().same_node(&node));
    }
}
