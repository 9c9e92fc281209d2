//! fragment::instance
//!
//! One live, mounted copy of a fragment's template.
//!
//! An instance owns an independent deep clone of the template body, an
//! opaque state payload the runtime threads through unexamined, and a weak
//! back-reference to its originating fragment — instances never keep a
//! fragment alive beyond its registry ownership.

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use uuid::Uuid;

use super::{Fragment, FragmentShared};
use crate::dom::Node;

/// Shared instance state.
struct InstanceShared {
    /// Opaque instance handle identity.
    id: Uuid,
    /// The originating fragment's name, kept for diagnostics and lifecycle
    /// notifications even if the fragment is dropped.
    fragment_name: String,
    /// Independent clone of the template body.
    content: Node,
    /// Opaque instance state; never examined by the runtime.
    state: Option<Value>,
    /// Weak back-reference to the originating fragment.
    fragment: Weak<FragmentShared>,
}

/// A live instance of a fragment.
///
/// Cloning the handle shares the instance; use [`FragmentInstance::same_instance`]
/// for identity.
#[derive(Clone)]
pub struct FragmentInstance {
    inner: Arc<InstanceShared>,
}

impl FragmentInstance {
    pub(crate) fn new(fragment: &Fragment, content: Node, state: Option<Value>) -> Self {
        Self {
            inner: Arc::new(InstanceShared {
                id: Uuid::new_v4(),
                fragment_name: fragment.name().to_string(),
                content,
                state,
                fragment: Arc::downgrade(&fragment.inner),
            }),
        }
    }

    /// The opaque instance identity.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The instance's content subtree.
    pub fn content(&self) -> Node {
        self.inner.content.clone()
    }

    /// The opaque instance state, if any.
    pub fn state(&self) -> Option<&Value> {
        self.inner.state.as_ref()
    }

    /// The originating fragment, when still alive.
    pub fn fragment(&self) -> Option<Fragment> {
        self.inner.fragment.upgrade().map(|inner| Fragment { inner })
    }

    /// The originating fragment's name.
    pub fn fragment_name(&self) -> &str {
        &self.inner.fragment_name
    }

    /// Whether two handles refer to the same instance.
    pub fn same_instance(&self, other: &FragmentInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for FragmentInstance {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Eq for FragmentInstance {}

impl fmt::Debug for FragmentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentInstance")
            .field("id", &self.inner.id)
            .field("fragment", &self.inner.fragment_name)
            .field("has_state", &self.inner.state.is_some())
            .finish()
    }
}
