//! core::config
//!
//! The application configuration map.
//!
//! # Overview
//!
//! Configuration is a flat mapping of string keys to JSON values, rebuilt
//! from scratch on every resolution pass so no stale keys survive a reload.
//!
//! # Precedence
//!
//! Within one configuration group, values are layered in this order (later
//! overrides earlier):
//! 1. Fetched configuration documents, merged in source document order
//! 2. Inline directives (always string values), unless
//!    `disableClientDirectives` is set by the time they would apply
//!
//! Groups are processed in document order, so a later group's values
//! overwrite an earlier group's for the same key.
//!
//! # Truthiness
//!
//! Reserved boolean keys may arrive as JSON booleans (from configuration
//! documents) or strings (from inline directives). A value is truthy when
//! it is `true`, a non-zero number, a non-empty string other than
//! `"false"`/`"0"` (case-insensitive), or any array/object. Everything else
//! is falsy.
//!
//! # Example
//!
//! ```
//! use proscenium::core::Config;
//! use serde_json::json;
//!
//! let mut config = Config::new();
//! config.merge_document(&json!({"a": 1, "b": 2})).unwrap();
//! config.merge_document(&json!({"b": 3, "c": 4})).unwrap();
//!
//! assert_eq!(config.get("a"), Some(&json!(1)));
//! assert_eq!(config.get("b"), Some(&json!(3)));
//! assert_eq!(config.get("c"), Some(&json!(4)));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use super::types::key;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration document must be a JSON object.
    #[error("configuration document is not an object")]
    NotAnObject,
}

/// Flat configuration map with reserved-key accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: BTreeMap<String, Value>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every key. Called at the start of each resolution pass.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a value, returning the key for callback tracking.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> String {
        let name = name.into();
        self.values.insert(name.clone(), value);
        name
    }

    /// Set a string value (inline directives are always strings).
    pub fn set_str(&mut self, name: impl Into<String>, value: impl Into<String>) -> String {
        self.set(name, Value::String(value.into()))
    }

    /// Merge a configuration document into the map; later keys overwrite
    /// earlier ones. Returns the keys written, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAnObject`] when the document is not a JSON
    /// object.
    pub fn merge_document(&mut self, document: &Value) -> Result<Vec<String>, ConfigError> {
        let object = document.as_object().ok_or(ConfigError::NotAnObject)?;
        let mut written = Vec::with_capacity(object.len());
        for (name, value) in object {
            self.values.insert(name.clone(), value.clone());
            written.push(name.clone());
        }
        Ok(written)
    }

    /// Whether a key holds a truthy value (see module docs).
    pub fn is_truthy(&self, name: &str) -> bool {
        match self.values.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => {
                !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0"
            }
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// A key's value as a string, when it is one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    // =========================================================================
    // Reserved-key accessors
    // =========================================================================

    /// The pages directory, when configured.
    pub fn pages_dir(&self) -> Option<&str> {
        self.get_str(key::PAGES_DIR)
    }

    /// The modules directory, when configured.
    pub fn modules_dir(&self) -> Option<&str> {
        self.get_str(key::MODULES_DIR)
    }

    /// Whether navigation runs the choreographed transition.
    ///
    /// Defaults to `false` when not configured.
    pub fn use_transitions(&self) -> bool {
        self.is_truthy(key::USE_TRANSITIONS)
    }

    /// Whether inline directives are suppressed.
    ///
    /// Defaults to `false` when not configured.
    pub fn directives_disabled(&self) -> bool {
        self.is_truthy(key::DISABLE_CLIENT_DIRECTIVES)
    }
}
