//! fragment
//!
//! Fragments (modules and pages) and their live instances.
//!
//! # Design
//!
//! A fragment is a named, path-addressed reusable template. Its source
//! document is fetched lazily through the transport; once loaded, the
//! template can be instanced any number of times. A page is a fragment
//! whose document is additionally split into sections (title, script
//! blocks, style blocks, head extras) when loading completes — dispatch is
//! on [`FragmentKind`], not a type hierarchy.
//!
//! A `Fragment` is a cheap clonable handle; the registry, the shell, and
//! spawned loader tasks all share the same underlying state. Instances hold
//! only a weak back-reference, so fragments are kept alive by the registry
//! and nothing else.
//!
//! # Lifecycle
//!
//! - created: by configuration bootstrap or explicit construction
//! - loaded: when the async fetch of the source document resolves; a load
//!   failure leaves the fragment unloaded and retryable
//! - instanced: [`Fragment::new_instance`] deep-clones the template body
//! - retired: the navigation engine releases an instance from the
//!   fragment's list once its content leaves the tree

pub mod instance;

pub use instance::FragmentInstance;

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;

use crate::core::types::{tag, FragmentKind, SCRIPT_RUN_ATTR, SCRIPT_RUN_DEFERRED};
use crate::dom::{Node, NodeSpec};
use crate::transport::{Transport, TransportError};

/// Errors from fragment operations.
#[derive(Debug, Error)]
pub enum FragmentError {
    /// The fragment's template has not been loaded yet.
    #[error("fragment '{0}' is not loaded")]
    NotLoaded(String),

    /// The source document could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The source document is not a valid node tree.
    #[error("invalid fragment document at '{path}': {message}")]
    Decode {
        /// The fragment's source path.
        path: String,
        /// Decoder error message.
        message: String,
    },

    /// The source document has no `body` section to instance.
    #[error("fragment document at '{0}' has no body section")]
    MissingBody(String),
}

/// The loaded template of a fragment.
struct Template {
    /// Head section, when the document has one.
    head: Option<Node>,
    /// Body section; the subtree instances are cloned from.
    body: Node,
    /// Page sections; `None` for modules.
    sections: Option<PageSections>,
}

/// Sections split out of a loaded page document.
///
/// Script blocks are classified by their `run` attribute: `run="deferred"`
/// blocks execute once the page settles as `main`, everything else runs
/// when the page enters the tree as `next`. Execution itself belongs to
/// host collaborators; the runtime only classifies and exposes the blocks.
#[derive(Debug, Clone, Default)]
pub struct PageSections {
    /// The page title, from `head > title`.
    pub title: Option<String>,
    /// Script blocks that run when the page enters the tree.
    pub run_first: Vec<Node>,
    /// Script blocks that run once the page settles as main.
    pub deferred: Vec<Node>,
    /// Style blocks.
    pub styles: Vec<Node>,
    /// Other head nodes (metadata the host may project).
    pub head_extras: Vec<Node>,
}

/// Mutable fragment state behind the handle.
struct FragmentState {
    template: Option<Template>,
    instances: Vec<FragmentInstance>,
}

/// Shared fragment state.
pub(crate) struct FragmentShared {
    name: String,
    path: String,
    kind: FragmentKind,
    /// Default instance state from the manifest record, if any.
    default_state: Option<Value>,
    transport: Arc<dyn Transport>,
    /// Placeholder node parked in the shell's cache holder.
    node: Node,
    state: Mutex<FragmentState>,
}

/// A named, path-addressed reusable template (module or page).
#[derive(Clone)]
pub struct Fragment {
    pub(crate) inner: Arc<FragmentShared>,
}

impl Fragment {
    fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        kind: FragmentKind,
        transport: Arc<dyn Transport>,
        default_state: Option<Value>,
    ) -> Self {
        let name = name.into();
        let node = Node::new(kind.tag());
        node.set_attribute("name", name.clone());
        Self {
            inner: Arc::new(FragmentShared {
                name,
                path: path.into(),
                kind,
                default_state,
                transport,
                node,
                state: Mutex::new(FragmentState {
                    template: None,
                    instances: Vec::new(),
                }),
            }),
        }
    }

    /// Create an unloaded module fragment.
    pub fn module(
        name: impl Into<String>,
        path: impl Into<String>,
        transport: Arc<dyn Transport>,
        default_state: Option<Value>,
    ) -> Self {
        Self::new(name, path, FragmentKind::Module, transport, default_state)
    }

    /// Create an unloaded page fragment.
    pub fn page(
        name: impl Into<String>,
        path: impl Into<String>,
        transport: Arc<dyn Transport>,
        default_state: Option<Value>,
    ) -> Self {
        Self::new(name, path, FragmentKind::Page, transport, default_state)
    }

    /// The fragment's registry name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The fragment's source path.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// The fragment's kind.
    pub fn kind(&self) -> FragmentKind {
        self.inner.kind
    }

    /// The placeholder node parked in the cache holder while registered.
    pub fn node(&self) -> Node {
        self.inner.node.clone()
    }

    /// Whether the template has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.state.lock().unwrap().template.is_some()
    }

    /// Whether two handles refer to the same fragment.
    pub fn same_fragment(&self, other: &Fragment) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch and parse the fragment's source document.
    ///
    /// Loading an already-loaded fragment is a no-op. On failure the
    /// fragment stays unloaded and the call may be retried.
    ///
    /// # Errors
    ///
    /// - [`FragmentError::Transport`] when the fetch fails
    /// - [`FragmentError::Decode`] when the document is not a node tree
    /// - [`FragmentError::MissingBody`] when there is no body section
    pub async fn load(&self) -> Result<(), FragmentError> {
        if self.is_loaded() {
            return Ok(());
        }

        let text = self.inner.transport.fetch_text(&self.inner.path).await?;
        let spec = NodeSpec::from_json(&text).map_err(|e| FragmentError::Decode {
            path: self.inner.path.clone(),
            message: e.to_string(),
        })?;
        let document = Node::from_spec(&spec);

        let head = document.find_first(tag::HEAD);
        let body = document
            .find_first(tag::BODY)
            .ok_or_else(|| FragmentError::MissingBody(self.inner.path.clone()))?;

        let sections = self
            .inner
            .kind
            .has_sections()
            .then(|| Self::split_sections(&document, head.as_ref()));

        let mut state = self.inner.state.lock().unwrap();
        state.template = Some(Template {
            head,
            body,
            sections,
        });
        Ok(())
    }

    fn split_sections(document: &Node, head: Option<&Node>) -> PageSections {
        let mut sections = PageSections {
            title: document
                .find_first(tag::TITLE)
                .and_then(|t| t.text())
                .filter(|t| !t.is_empty()),
            ..PageSections::default()
        };

        for script in document.find_all(tag::SCRIPT) {
            let deferred = script
                .attribute(SCRIPT_RUN_ATTR)
                .is_some_and(|run| run == SCRIPT_RUN_DEFERRED);
            if deferred {
                sections.deferred.push(script);
            } else {
                sections.run_first.push(script);
            }
        }

        sections.styles = document.find_all(tag::STYLE);

        if let Some(head) = head {
            sections.head_extras = head
                .children()
                .into_iter()
                .filter(|n| {
                    let t = n.tag();
                    t != tag::SCRIPT && t != tag::STYLE && t != tag::TITLE
                })
                .collect();
        }
        sections
    }

    // =========================================================================
    // Template access
    // =========================================================================

    /// The loaded template body (the shared subtree instances clone from).
    ///
    /// Mutating this node changes what future instances receive; existing
    /// instances are unaffected.
    pub fn template_body(&self) -> Option<Node> {
        let state = self.inner.state.lock().unwrap();
        state.template.as_ref().map(|t| t.body.clone())
    }

    /// The loaded head section, if the document has one.
    pub fn head(&self) -> Option<Node> {
        let state = self.inner.state.lock().unwrap();
        state.template.as_ref().and_then(|t| t.head.clone())
    }

    /// The page sections, once loaded. Always `None` for modules.
    pub fn sections(&self) -> Option<PageSections> {
        let state = self.inner.state.lock().unwrap();
        state.template.as_ref().and_then(|t| t.sections.clone())
    }

    /// The page title, once loaded.
    pub fn title(&self) -> Option<String> {
        self.sections().and_then(|s| s.title)
    }

    // =========================================================================
    // Instancing
    // =========================================================================

    /// Spawn a new live instance of the loaded template.
    ///
    /// The instance receives a deep, independent clone of the template
    /// body; mutations on one instance never affect the template or sibling
    /// instances. When `state` is `None`, the fragment's manifest-provided
    /// default state is used.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::NotLoaded`] when the fragment has not
    /// loaded yet.
    pub fn new_instance(&self, state: Option<Value>) -> Result<FragmentInstance, FragmentError> {
        let mut guard = self.inner.state.lock().unwrap();
        let template = guard
            .template
            .as_ref()
            .ok_or_else(|| FragmentError::NotLoaded(self.inner.name.clone()))?;

        let content = template.body.deep_clone();
        content.set_attribute("fragment", self.inner.name.clone());

        let instance = FragmentInstance::new(
            self,
            content,
            state.or_else(|| self.inner.default_state.clone()),
        );
        guard.instances.push(instance.clone());
        Ok(instance)
    }

    /// All instances ever spawned and not yet released, in spawn order.
    pub fn instances(&self) -> Vec<FragmentInstance> {
        self.inner.state.lock().unwrap().instances.clone()
    }

    /// Number of live (unreleased) instances.
    pub fn instance_count(&self) -> usize {
        self.inner.state.lock().unwrap().instances.len()
    }

    /// Drop a retired instance from the fragment's list.
    ///
    /// Called by the navigation engine when an instance's content leaves
    /// the tree. Returns `true` if the instance was present.
    pub fn release_instance(&self, instance: &FragmentInstance) -> bool {
        let mut state = self.inner.state.lock().unwrap();
        let before = state.instances.len();
        state.instances.retain(|i| !i.same_instance(instance));
        state.instances.len() != before
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("name", &self.inner.name)
            .field("path", &self.inner.path)
            .field("kind", &self.inner.kind)
            .field("loaded", &self.is_loaded())
            .field("instances", &self.instance_count())
            .finish()
    }
}
