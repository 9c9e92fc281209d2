//! core::types
//!
//! Shared vocabulary for the shell: well-known tags, reserved configuration
//! keys, state tags, fragment kinds, and the directory-manifest schema.
//!
//! # Types
//!
//! - [`FragmentKind`] - Module vs. Page, with the page capability flag
//! - [`StateTag`] - the attribute protocol driven by navigation
//! - [`ManifestEntry`] - one record of a `<dir>/index.json` manifest

use serde::{Deserialize, Serialize};

/// Well-known tags of the declarative tree.
pub mod tag {
    /// Application root.
    pub const APP: &str = "app";
    /// Configuration group.
    pub const CONFIG: &str = "config";
    /// External configuration file reference (attr `src`).
    pub const CONFIG_FILE: &str = "config-file";
    /// Inline configuration directive (attrs `name`, `value`).
    pub const PROPERTY: &str = "property";
    /// Hidden holder for not-yet-visible fragments.
    pub const CACHE: &str = "cache";
    /// Module placeholder / source root.
    pub const MODULE: &str = "module";
    /// Page placeholder / source root.
    pub const PAGE: &str = "page";
    /// Fragment head section.
    pub const HEAD: &str = "head";
    /// Fragment body section (the instanced template).
    pub const BODY: &str = "body";
    /// Script block inside a page.
    pub const SCRIPT: &str = "script";
    /// Style block inside a page.
    pub const STYLE: &str = "style";
    /// Page title.
    pub const TITLE: &str = "title";
}

/// Reserved configuration keys.
pub mod key {
    /// Directory whose manifest bootstraps pages.
    pub const PAGES_DIR: &str = "pagesDir";
    /// Directory whose manifest bootstraps modules.
    pub const MODULES_DIR: &str = "modulesDir";
    /// Selects choreographed vs. instant navigation.
    pub const USE_TRANSITIONS: &str = "useTransitions";
    /// Suppresses inline directive processing.
    pub const DISABLE_CLIENT_DIRECTIVES: &str = "disableClientDirectives";
}

/// Attribute on `script` blocks selecting the execution phase.
pub const SCRIPT_RUN_ATTR: &str = "run";

/// `run` attribute value marking a script as deferred.
pub const SCRIPT_RUN_DEFERRED: &str = "deferred";

/// The kind of a fragment.
///
/// Pages are navigable and carry sectioned documents (title, scripts,
/// styles); modules are plain reusable fragments. Dispatch happens on this
/// tag, not on a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Reusable, non-navigable fragment.
    Module,
    /// Navigable fragment with sectioned content.
    Page,
}

impl FragmentKind {
    /// The placeholder tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            FragmentKind::Module => tag::MODULE,
            FragmentKind::Page => tag::PAGE,
        }
    }

    /// Whether fragments of this kind carry page sections.
    pub fn has_sections(self) -> bool {
        matches!(self, FragmentKind::Page)
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentKind::Module => write!(f, "module"),
            FragmentKind::Page => write!(f, "page"),
        }
    }
}

/// State tags written onto page content during navigation.
///
/// External observers key off these attributes: `next` marks content that
/// just entered the tree, `main` the settled visible page, `previous` the
/// outgoing page about to be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTag {
    /// Content inserted but not yet committed as visible.
    Next,
    /// The settled, visible page.
    Main,
    /// The outgoing page, still attached.
    Previous,
}

impl StateTag {
    /// The attribute name for this tag.
    pub fn attr(self) -> &'static str {
        match self {
            StateTag::Next => "next",
            StateTag::Main => "main",
            StateTag::Previous => "previous",
        }
    }
}

impl std::fmt::Display for StateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attr())
    }
}

/// One record of a directory manifest (`<dir>/index.json`).
///
/// # Example
///
/// ```
/// use proscenium::core::types::ManifestEntry;
///
/// let entries: Vec<ManifestEntry> = serde_json::from_str(
///     r#"[{"path": "home.json", "name": "home", "firstPage": true},
///         {"path": "about.json", "name": "about"}]"#,
/// )
/// .unwrap();
///
/// assert!(entries[0].first_page);
/// assert!(!entries[1].first_page);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManifestEntry {
    /// Source path relative to the manifest's directory.
    pub path: String,
    /// Registry name for the fragment.
    pub name: String,
    /// Default instance state, passed through opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    /// Marks the page to navigate to once the manifest is processed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub first_page: bool,
    /// Marks a module for eager loading.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autoload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_and_capabilities() {
        assert_eq!(FragmentKind::Module.tag(), "module");
        assert_eq!(FragmentKind::Page.tag(), "page");
        assert!(FragmentKind::Page.has_sections());
        assert!(!FragmentKind::Module.has_sections());
    }

    #[test]
    fn state_tag_attrs() {
        assert_eq!(StateTag::Next.attr(), "next");
        assert_eq!(StateTag::Main.attr(), "main");
        assert_eq!(StateTag::Previous.attr(), "previous");
    }

    #[test]
    fn manifest_entry_defaults() {
        let entry: ManifestEntry =
            serde_json::from_str(r#"{"path": "nav.json", "name": "nav"}"#).unwrap();
        assert_eq!(entry.name, "nav");
        assert!(entry.state.is_none());
        assert!(!entry.first_page);
        assert!(!entry.autoload);
    }

    #[test]
    fn manifest_entry_camel_case() {
        let entry: ManifestEntry = serde_json::from_str(
            r#"{"path": "home.json", "name": "home", "firstPage": true, "autoload": true,
                "state": {"greeting": "hi"}}"#,
        )
        .unwrap();
        assert!(entry.first_page);
        assert!(entry.autoload);
        assert_eq!(entry.state.unwrap()["greeting"], "hi");
    }

    #[test]
    fn manifest_entry_rejects_unknown_fields() {
        let result: Result<ManifestEntry, _> =
            serde_json::from_str(r#"{"path": "p", "name": "n", "first_page": true}"#);
        assert!(result.is_err());
    }
}
