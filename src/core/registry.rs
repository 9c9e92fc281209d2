//! core::registry
//!
//! Insertion-ordered, uniqueness-enforcing fragment index.
//!
//! # Design
//!
//! A registry maps fragment names to fragments, preserving insertion order
//! for iteration. Adding a name that already exists fails; removing an
//! absent name is a no-op. A registry may be restricted to a single
//! fragment kind (the shell's page registry only accepts pages).
//!
//! `initialize` drives each fragment's load hook in iteration order and
//! isolates failures: one fragment failing to load never blocks its
//! siblings.
//!
//! # Example
//!
//! ```
//! use proscenium::core::{Registry, RegistryError};
//! use proscenium::fragment::Fragment;
//! use proscenium::transport::MockTransport;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(MockTransport::new());
//! let mut registry = Registry::new();
//!
//! let nav = Fragment::module("nav", "modules/nav.json", transport.clone(), None);
//! registry.add(nav).unwrap();
//!
//! let dup = Fragment::module("nav", "modules/nav2.json", transport, None);
//! assert!(matches!(registry.add(dup), Err(RegistryError::DuplicateName(_))));
//! assert_eq!(registry.len(), 1);
//! ```

use thiserror::Error;
use tracing::warn;

use super::types::FragmentKind;
use crate::fragment::Fragment;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A fragment with this name is already registered.
    #[error("fragment '{0}' already exists in the registry")]
    DuplicateName(String),

    /// The fragment's kind is not accepted by this registry.
    #[error("registry accepts only {expected} fragments, got {actual} '{name}'")]
    TypeMismatch {
        /// The kind this registry accepts.
        expected: FragmentKind,
        /// The offered fragment's kind.
        actual: FragmentKind,
        /// The offered fragment's name.
        name: String,
    },
}

/// Name-keyed fragment collection, iterated in insertion order.
///
/// Cloning a registry clones the index, not the fragments; both clones
/// share the same fragment handles.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Fragment>,
    accepts: Option<FragmentKind>,
}

impl Registry {
    /// Create a registry accepting any fragment kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry restricted to pages.
    pub fn pages() -> Self {
        Self {
            entries: Vec::new(),
            accepts: Some(FragmentKind::Page),
        }
    }

    /// Number of registered fragments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a fragment.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::TypeMismatch`] when the registry is kind-restricted
    ///   and the fragment does not match
    /// - [`RegistryError::DuplicateName`] when the name is already taken
    pub fn add(&mut self, fragment: Fragment) -> Result<(), RegistryError> {
        if let Some(expected) = self.accepts {
            if fragment.kind() != expected {
                return Err(RegistryError::TypeMismatch {
                    expected,
                    actual: fragment.kind(),
                    name: fragment.name().to_string(),
                });
            }
        }
        if self.get(fragment.name()).is_some() {
            return Err(RegistryError::DuplicateName(fragment.name().to_string()));
        }
        self.entries.push(fragment);
        Ok(())
    }

    /// Remove a fragment by name, returning it when present.
    ///
    /// Removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<Fragment> {
        let index = self.entries.iter().position(|f| f.name() == name)?;
        Some(self.entries.remove(index))
    }

    /// Look up a fragment by name.
    pub fn get(&self, name: &str) -> Option<Fragment> {
        self.entries.iter().find(|f| f.name() == name).cloned()
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|f| f.name() == name)
    }

    /// Iterate fragments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.entries.iter()
    }

    /// Snapshot of the registered fragments, in insertion order.
    pub fn fragments(&self) -> Vec<Fragment> {
        self.entries.clone()
    }

    /// Run each fragment's initialization hook in iteration order.
    ///
    /// Failures are isolated per fragment: a load error is logged and the
    /// remaining fragments still initialize.
    pub async fn initialize(&self) {
        for fragment in &self.entries {
            if let Err(error) = fragment.load().await {
                warn!(
                    fragment = fragment.name(),
                    kind = %fragment.kind(),
                    %error,
                    "fragment initialization failed"
                );
            }
        }
    }
}
