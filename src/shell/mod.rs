//! shell
//!
//! The application shell: orchestrates configuration resolution, fragment
//! registries, and page navigation over a declarative root tree.
//!
//! # Architecture
//!
//! The shell is the central coordinator. Startup follows a uniform
//! lifecycle:
//!
//! ```text
//! initialize -> resolve configuration -> initialize modules -> initialize pages
//! ```
//!
//! Configuration resolution (see [`resolve`]) may bootstrap fragments from
//! directory manifests and navigate to a designated first page. Navigation
//! (see [`navigate`]) swaps the visible page through an ordered state-tag
//! machine with explicit commit barriers between steps.
//!
//! # Invariants
//!
//! - At most one page instance is current at any time; the previous
//!   instance is retained only while a transition is in flight.
//! - The registries and the configuration map are mutated only by the
//!   shell's own methods.
//! - Only one configuration resolution runs at a time; overlapping calls
//!   are rejected, not raced.
//!
//! # Example
//!
//! ```
//! use proscenium::dom::{Node, NodeSpec};
//! use proscenium::shell::Shell;
//! use proscenium::transport::MockTransport;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(MockTransport::new());
//! let root = Node::from_spec(&NodeSpec::from_json(
//!     r#"{"tag": "app", "attrs": {"name": "demo"}}"#,
//! ).unwrap());
//!
//! let shell = Shell::builder("demo", transport).root(root).build();
//! shell.initialize().await.unwrap();
//! assert!(shell.config().is_empty());
//! # });
//! ```

pub mod barrier;
pub mod navigate;
pub mod observer;
pub mod resolve;

pub use barrier::{CommitBarrier, RecordingBarrier, YieldBarrier};
pub use navigate::{NavTarget, NavigateError};
pub use observer::{LifecycleEvent, RecordingObserver, ShellObserver};
pub use resolve::ResolveError;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::warn;

use crate::core::config::Config;
use crate::core::registry::{Registry, RegistryError};
use crate::core::types::tag;
use crate::dom::Node;
use crate::fragment::{Fragment, FragmentInstance};
use crate::transport::Transport;

/// Errors from shell startup.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Configuration resolution failed.
    #[error("configuration resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// The page-instance slots.
///
/// `previous` is occupied only between the start and completion of a
/// navigation.
#[derive(Default)]
struct PageSlots {
    current: Option<FragmentInstance>,
    previous: Option<FragmentInstance>,
}

/// Shared shell state behind the handle.
pub(crate) struct ShellShared {
    pub(crate) name: String,
    pub(crate) root: Node,
    pub(crate) cache: Mutex<Option<Node>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) barrier: Arc<dyn CommitBarrier>,
    pub(crate) observers: Mutex<Vec<Arc<dyn ShellObserver>>>,
    pub(crate) config: Mutex<Config>,
    pub(crate) modules: Mutex<Registry>,
    pub(crate) pages: Mutex<Registry>,
    slots: Mutex<PageSlots>,
    pub(crate) resolving: AtomicBool,
}

/// The application shell.
///
/// A cheap clonable handle; clones share the same application. The name is
/// used as the display title.
#[derive(Clone)]
pub struct Shell {
    pub(crate) inner: Arc<ShellShared>,
}

impl Shell {
    /// Start building a shell with the given name and transport.
    pub fn builder(name: impl Into<String>, transport: Arc<dyn Transport>) -> ShellBuilder {
        ShellBuilder {
            name: name.into(),
            transport,
            root: None,
            barrier: None,
            observers: Vec::new(),
        }
    }

    /// The application name (display title).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The application root node.
    pub fn root(&self) -> Node {
        self.inner.root.clone()
    }

    /// The cache holder for not-yet-visible fragments, created under the
    /// root on first use.
    pub fn cache(&self) -> Node {
        let mut slot = self.inner.cache.lock().unwrap();
        if let Some(cache) = slot.as_ref() {
            return cache.clone();
        }
        let cache = self
            .inner
            .root
            .find_first(tag::CACHE)
            .unwrap_or_else(|| {
                let created = Node::new(tag::CACHE);
                // Fresh detached node; cannot form a cycle.
                self.inner.root.push_child_unchecked(&created);
                created
            });
        *slot = Some(cache.clone());
        cache
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.inner.config.lock().unwrap().clone()
    }

    /// Snapshot of the module registry.
    pub fn modules(&self) -> Registry {
        self.inner.modules.lock().unwrap().clone()
    }

    /// Snapshot of the page registry.
    pub fn pages(&self) -> Registry {
        self.inner.pages.lock().unwrap().clone()
    }

    /// The currently visible page instance, if any.
    pub fn current_page(&self) -> Option<FragmentInstance> {
        self.inner.slots.lock().unwrap().current.clone()
    }

    /// The outgoing page instance; `Some` only while a transition is in
    /// flight.
    pub fn previous_page(&self) -> Option<FragmentInstance> {
        self.inner.slots.lock().unwrap().previous.clone()
    }

    /// Register a lifecycle observer.
    pub fn add_observer(&self, observer: Arc<dyn ShellObserver>) {
        self.inner.observers.lock().unwrap().push(observer);
    }

    pub(crate) fn notify(&self, event: LifecycleEvent) {
        let observers = self.inner.observers.lock().unwrap().clone();
        for observer in observers {
            observer.notify(&event);
        }
    }

    pub(crate) fn rotate_slots(&self, incoming: FragmentInstance) -> Option<FragmentInstance> {
        let mut slots = self.inner.slots.lock().unwrap();
        slots.previous = slots.current.take();
        slots.current = Some(incoming);
        slots.previous.clone()
    }

    pub(crate) fn finish_transition(&self) {
        self.inner.slots.lock().unwrap().previous = None;
    }

    // =========================================================================
    // Cache membership
    // =========================================================================

    /// Register a fragment and park its placeholder node in the cache
    /// holder.
    ///
    /// The fragment lands in the module or page registry according to its
    /// kind.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError::DuplicateName`]; a type mismatch cannot
    /// occur here because dispatch follows the fragment's own kind.
    pub fn add_to_cache(&self, fragment: &Fragment) -> Result<(), RegistryError> {
        {
            let mut registry = match fragment.kind() {
                crate::core::FragmentKind::Module => self.inner.modules.lock().unwrap(),
                crate::core::FragmentKind::Page => self.inner.pages.lock().unwrap(),
            };
            registry.add(fragment.clone())?;
        }
        if let Err(error) = self.cache().append_child(&fragment.node()) {
            warn!(
                fragment = fragment.name(),
                %error,
                "failed to park fragment in cache holder"
            );
        }
        Ok(())
    }

    /// Remove a fragment from its registry and detach its placeholder node.
    ///
    /// Returns `true` if the fragment was registered.
    pub fn remove_from_cache(&self, fragment: &Fragment) -> bool {
        let removed = {
            let mut registry = match fragment.kind() {
                crate::core::FragmentKind::Module => self.inner.modules.lock().unwrap(),
                crate::core::FragmentKind::Page => self.inner.pages.lock().unwrap(),
            };
            registry.remove(fragment.name())
        };
        match removed {
            Some(fragment) => {
                fragment.node().detach();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Run the startup lifecycle: resolve configuration, then initialize
    /// modules, then pages.
    ///
    /// # Errors
    ///
    /// Structural configuration errors (duplicate first page, malformed
    /// manifest or configuration document) surface here. Per-fragment load
    /// failures during registry initialization are contained and logged.
    pub async fn initialize(&self) -> Result<(), ShellError> {
        self.cache();
        self.resolve().await?;

        // Snapshots share fragment handles with the live registries, so
        // loading through them is loading the registered fragments.
        let modules = self.modules();
        modules.initialize().await;
        let pages = self.pages();
        pages.initialize().await;
        Ok(())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("name", &self.inner.name)
            .field("transport", &self.inner.transport.name())
            .field("modules", &self.modules().len())
            .field("pages", &self.pages().len())
            .field("has_current_page", &self.current_page().is_some())
            .finish()
    }
}

/// Builder for [`Shell`].
pub struct ShellBuilder {
    name: String,
    transport: Arc<dyn Transport>,
    root: Option<Node>,
    barrier: Option<Arc<dyn CommitBarrier>>,
    observers: Vec<Arc<dyn ShellObserver>>,
}

impl ShellBuilder {
    /// Use an existing application root node instead of creating one.
    pub fn root(mut self, root: Node) -> Self {
        self.root = Some(root);
        self
    }

    /// Use a custom commit barrier (defaults to [`YieldBarrier`]).
    pub fn barrier(mut self, barrier: Arc<dyn CommitBarrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Register a lifecycle observer.
    pub fn observer(mut self, observer: Arc<dyn ShellObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the shell.
    pub fn build(self) -> Shell {
        let root = self.root.unwrap_or_else(|| {
            let root = Node::new(tag::APP);
            root.set_attribute("name", self.name.clone());
            root
        });
        Shell {
            inner: Arc::new(ShellShared {
                name: self.name,
                root,
                cache: Mutex::new(None),
                transport: self.transport,
                barrier: self
                    .barrier
                    .unwrap_or_else(|| Arc::new(YieldBarrier)),
                observers: Mutex::new(self.observers),
                config: Mutex::new(Config::new()),
                modules: Mutex::new(Registry::new()),
                pages: Mutex::new(Registry::pages()),
                slots: Mutex::new(PageSlots::default()),
                resolving: AtomicBool::new(false),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn shell() -> Shell {
        Shell::builder("demo", Arc::new(MockTransport::new())).build()
    }

    #[test]
    fn builder_creates_named_root() {
        let shell = shell();
        assert_eq!(shell.name(), "demo");
        assert_eq!(shell.root().tag(), "app");
        assert_eq!(shell.root().attribute("name").as_deref(), Some("demo"));
    }

    #[test]
    fn cache_is_created_once_under_root() {
        let shell = shell();
        let cache = shell.cache();
        assert!(cache.parent().unwrap().same_node(&shell.root()));
        assert!(shell.cache().same_node(&cache));
        assert_eq!(shell.root().find_all(tag::CACHE).len(), 1);
    }

    #[test]
    fn existing_cache_node_is_reused() {
        let root = Node::new(tag::APP);
        let existing = Node::new(tag::CACHE);
        root.append_child(&existing).unwrap();

        let shell = Shell::builder("demo", Arc::new(MockTransport::new()))
            .root(root)
            .build();
        assert!(shell.cache().same_node(&existing));
    }

    #[test]
    fn add_to_cache_dispatches_by_kind() {
        let transport = Arc::new(MockTransport::new());
        let shell = Shell::builder("demo", transport.clone()).build();

        let module = Fragment::module("nav", "modules/nav.json", transport.clone(), None);
        let page = Fragment::page("home", "pages/home.json", transport, None);

        shell.add_to_cache(&module).unwrap();
        shell.add_to_cache(&page).unwrap();

        assert!(shell.modules().contains("nav"));
        assert!(shell.pages().contains("home"));
        assert!(module.node().parent().unwrap().same_node(&shell.cache()));
        assert!(page.node().parent().unwrap().same_node(&shell.cache()));
    }

    #[test]
    fn remove_from_cache_detaches_placeholder() {
        let transport = Arc::new(MockTransport::new());
        let shell = Shell::builder("demo", transport.clone()).build();
        let module = Fragment::module("nav", "modules/nav.json", transport, None);

        shell.add_to_cache(&module).unwrap();
        assert!(shell.remove_from_cache(&module));

        assert!(!shell.modules().contains("nav"));
        assert!(module.node().parent().is_none());
        assert!(!shell.remove_from_cache(&module));
    }

    #[test]
    fn duplicate_cache_add_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        let shell = Shell::builder("demo", transport.clone()).build();

        let first = Fragment::module("nav", "modules/nav.json", transport.clone(), None);
        let second = Fragment::module("nav", "modules/other.json", transport, None);

        shell.add_to_cache(&first).unwrap();
        assert!(matches!(
            shell.add_to_cache(&second),
            Err(RegistryError::DuplicateName(_))
        ));
        assert_eq!(shell.modules().len(), 1);
    }
}
