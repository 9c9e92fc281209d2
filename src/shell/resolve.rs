//! shell::resolve
//!
//! Configuration resolution and manifest bootstrap.
//!
//! # Algorithm
//!
//! A resolution pass rebuilds the configuration map from scratch, then
//! walks the root's `config` groups in document order. Per group:
//!
//! 1. Fetch every referenced `config-file` document concurrently and merge
//!    the results in *source document order* (not completion order).
//! 2. Unless `disableClientDirectives` is truthy by now, apply inline
//!    `property` directives, which override file-sourced values.
//! 3. Run reserved-key callbacks for the keys this group wrote:
//!    `modulesDir` / `pagesDir` trigger directory-manifest bootstrap.
//!
//! Groups are strictly sequential: a group's callbacks (including
//! *initiating* its background fragment loads) complete before the next
//! group begins. The background loads themselves are fire-and-forget and
//! may finish in any order.
//!
//! # Reentrancy
//!
//! Overlapping resolution passes would race each other's callbacks against
//! the freshly reset map, so they are explicitly serialized: a second
//! `resolve` while one is in flight fails fast with
//! [`ResolveError::InFlight`].
//!
//! # Failure
//!
//! Structural problems — an unreachable or malformed configuration
//! document, a malformed manifest, a duplicate first page — abort the pass
//! and surface to the caller. Background fragment loads fail individually
//! and are only logged.

use std::sync::atomic::Ordering;

use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::navigate::NavigateError;
use super::Shell;
use crate::core::registry::RegistryError;
use crate::core::types::{key, tag, ManifestEntry};
use crate::fragment::{Fragment, FragmentError};
use crate::transport::{fetch_json, TransportError};

/// Errors from configuration resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A resolution pass is already running.
    #[error("configuration resolution already in flight")]
    InFlight,

    /// More than one manifest record claims to be the first page.
    #[error("configuration conflict: multiple pages declared as first page in '{0}'")]
    Conflict(String),

    /// A configuration or manifest document could not be fetched.
    #[error("failed to fetch '{path}': {source}")]
    Transport {
        /// The requested path.
        path: String,
        /// The transport failure.
        source: TransportError,
    },

    /// A configuration document is not a JSON object.
    #[error("invalid configuration document at '{path}': {message}")]
    Config {
        /// The document's path.
        path: String,
        /// Decoder error message.
        message: String,
    },

    /// A directory manifest does not match the expected shape.
    #[error("invalid directory manifest at '{path}': {message}")]
    Manifest {
        /// The manifest's path.
        path: String,
        /// Decoder error message.
        message: String,
    },

    /// A bootstrapped fragment collided with a registered name.
    #[error("bootstrap failed: {0}")]
    Registry(#[from] RegistryError),

    /// The designated first page failed to load.
    #[error("first page '{name}' failed to load: {source}")]
    FirstPage {
        /// The page's name.
        name: String,
        /// The load failure.
        source: FragmentError,
    },

    /// Navigating to the designated first page failed.
    #[error("first page navigation failed: {0}")]
    Navigate(#[from] NavigateError),
}

impl Shell {
    /// Run one configuration resolution pass over the root tree.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`]; all structural errors abort the pass. The
    /// configuration map is left as resolved up to the failure point — a
    /// subsequent successful pass rebuilds it from scratch.
    pub async fn resolve(&self) -> Result<(), ResolveError> {
        if self.inner.resolving.swap(true, Ordering::SeqCst) {
            return Err(ResolveError::InFlight);
        }
        let result = self.resolve_pass().await;
        self.inner.resolving.store(false, Ordering::SeqCst);
        result
    }

    async fn resolve_pass(&self) -> Result<(), ResolveError> {
        self.inner.config.lock().unwrap().clear();

        let groups = self.inner.root.find_all(tag::CONFIG);
        debug!(groups = groups.len(), "resolving configuration");

        for group in groups {
            // Keys written by this group, in write order; the callback set.
            let mut group_keys: Vec<String> = Vec::new();

            // (a) Referenced configuration files, fetched concurrently.
            let sources: Vec<String> = group
                .find_all(tag::CONFIG_FILE)
                .into_iter()
                .filter_map(|node| {
                    let src = node.attribute("src");
                    if src.is_none() {
                        warn!("config-file node without src attribute skipped");
                    }
                    src
                })
                .collect();

            if !sources.is_empty() {
                let fetches = sources
                    .iter()
                    .map(|src| self.inner.transport.fetch_text(src));
                let responses = join_all(fetches).await;

                // (b) Merge in source document order, not completion order.
                for (src, response) in sources.iter().zip(responses) {
                    let text = response.map_err(|source| ResolveError::Transport {
                        path: src.clone(),
                        source,
                    })?;
                    let document: Value =
                        serde_json::from_str(&text).map_err(|e| ResolveError::Config {
                            path: src.clone(),
                            message: e.to_string(),
                        })?;
                    let written = self
                        .inner
                        .config
                        .lock()
                        .unwrap()
                        .merge_document(&document)
                        .map_err(|e| ResolveError::Config {
                            path: src.clone(),
                            message: e.to_string(),
                        })?;
                    for key in written {
                        if !group_keys.contains(&key) {
                            group_keys.push(key);
                        }
                    }
                }
            }

            // (c) Inline directives, unless suppressed by now.
            let directives_disabled =
                self.inner.config.lock().unwrap().directives_disabled();
            if directives_disabled {
                debug!("inline directives disabled for this group");
            } else {
                for property in group.find_all(tag::PROPERTY) {
                    let Some(name) = property.attribute("name") else {
                        warn!("property node without name attribute skipped");
                        continue;
                    };
                    let value = property.attribute("value").unwrap_or_default();
                    let written = self.inner.config.lock().unwrap().set_str(name, value);
                    if !group_keys.contains(&written) {
                        group_keys.push(written);
                    }
                }
            }

            // (d) Reserved-key callbacks for this group's keys.
            self.run_config_callbacks(&group_keys).await?;
        }
        Ok(())
    }

    /// Fire bootstrap callbacks for reserved keys written by one group.
    ///
    /// Modules bootstrap before pages so shared fragments are registered by
    /// the time the first page renders.
    async fn run_config_callbacks(&self, keys: &[String]) -> Result<(), ResolveError> {
        if keys.iter().any(|k| k == key::MODULES_DIR) {
            if let Some(dir) = self.config().modules_dir().map(str::to_string) {
                self.bootstrap_modules(&dir).await?;
            }
        }
        if keys.iter().any(|k| k == key::PAGES_DIR) {
            if let Some(dir) = self.config().pages_dir().map(str::to_string) {
                self.bootstrap_pages(&dir).await?;
            }
        }
        Ok(())
    }

    async fn fetch_manifest(&self, dir: &str) -> Result<Vec<ManifestEntry>, ResolveError> {
        let path = format!("{dir}/index.json");
        fetch_json(self.inner.transport.as_ref(), &path)
            .await
            .map_err(|error| match error {
                TransportError::Decode { path, message } => {
                    ResolveError::Manifest { path, message }
                }
                source => ResolveError::Transport { path, source },
            })
    }

    async fn bootstrap_modules(&self, dir: &str) -> Result<(), ResolveError> {
        let entries = self.fetch_manifest(dir).await?;
        debug!(dir, count = entries.len(), "bootstrapping modules");

        for entry in entries {
            let module = Fragment::module(
                entry.name,
                format!("{dir}/{}", entry.path),
                self.inner.transport.clone(),
                entry.state,
            );
            self.add_to_cache(&module)?;
            if entry.autoload {
                spawn_load(module);
            }
        }
        Ok(())
    }

    async fn bootstrap_pages(&self, dir: &str) -> Result<(), ResolveError> {
        let entries = self.fetch_manifest(dir).await?;
        debug!(dir, count = entries.len(), "bootstrapping pages");

        let mut first_page: Option<Fragment> = None;
        for entry in entries {
            if entry.first_page && first_page.is_some() {
                return Err(ResolveError::Conflict(dir.to_string()));
            }
            let page = Fragment::page(
                entry.name,
                format!("{dir}/{}", entry.path),
                self.inner.transport.clone(),
                entry.state,
            );
            self.add_to_cache(&page)?;
            if entry.first_page {
                first_page = Some(page);
            } else {
                spawn_load(page);
            }
        }

        // Navigation needs a loaded fragment, so the first page's load is
        // the one load the bootstrap awaits.
        if let Some(page) = first_page {
            page.load().await.map_err(|source| ResolveError::FirstPage {
                name: page.name().to_string(),
                source,
            })?;
            self.navigate(&page).await?;
        }
        Ok(())
    }
}

/// Start a fire-and-forget background load.
fn spawn_load(fragment: Fragment) {
    tokio::spawn(async move {
        if let Err(error) = fragment.load().await {
            warn!(
                fragment = fragment.name(),
                kind = %fragment.kind(),
                %error,
                "background fragment load failed"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Node, NodeSpec};
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn app_root(body: &str) -> Node {
        Node::from_spec(&NodeSpec::from_json(body).unwrap())
    }

    fn shell_with_root(transport: Arc<MockTransport>, root: Node) -> Shell {
        Shell::builder("demo", transport).root(root).build()
    }

    #[tokio::test]
    async fn resolve_resets_the_map_each_pass() {
        let transport = Arc::new(MockTransport::new());
        let root = app_root(r#"{"tag": "app", "children": [{"tag": "config"}]}"#);
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();
        shell.resolve().await.unwrap();
        assert!(shell.config().is_empty());
    }

    #[tokio::test]
    async fn directives_populate_the_map() {
        let transport = Arc::new(MockTransport::new());
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "theme", "value": "dark"}},
                    {"tag": "property", "attrs": {"name": "useTransitions", "value": "true"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();
        let config = shell.config();
        assert_eq!(config.get_str("theme"), Some("dark"));
        assert!(config.use_transitions());
    }

    #[tokio::test]
    async fn config_files_merge_in_document_order() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("first.json", r#"{"a": 1, "b": 2}"#);
        transport.stage("second.json", r#"{"b": 3, "c": 4}"#);
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "config-file", "attrs": {"src": "first.json"}},
                    {"tag": "config-file", "attrs": {"src": "second.json"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();
        let config = shell.config();
        assert_eq!(config.get("a"), Some(&json!(1)));
        assert_eq!(config.get("b"), Some(&json!(3)));
        assert_eq!(config.get("c"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn directives_override_file_values() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("config.json", r#"{"theme": "dark"}"#);
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "config-file", "attrs": {"src": "config.json"}},
                    {"tag": "property", "attrs": {"name": "theme", "value": "light"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();
        assert_eq!(shell.config().get_str("theme"), Some("light"));
    }

    #[tokio::test]
    async fn file_sourced_flag_suppresses_directives() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("config.json", r#"{"disableClientDirectives": true}"#);
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "config-file", "attrs": {"src": "config.json"}},
                    {"tag": "property", "attrs": {"name": "theme", "value": "light"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();
        assert!(shell.config().get("theme").is_none());
    }

    #[tokio::test]
    async fn flag_from_earlier_group_suppresses_later_directives() {
        let transport = Arc::new(MockTransport::new());
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property",
                     "attrs": {"name": "disableClientDirectives", "value": "true"}}
                ]},
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "theme", "value": "light"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        // The first group's directives still apply (the flag was not yet
        // set when that group started); the second group's are suppressed.
        shell.resolve().await.unwrap();
        let config = shell.config();
        assert!(config.directives_disabled());
        assert!(config.get("theme").is_none());
    }

    #[tokio::test]
    async fn unreachable_config_file_is_fatal() {
        let transport = Arc::new(MockTransport::new());
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "config-file", "attrs": {"src": "missing.json"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        assert!(matches!(
            shell.resolve().await,
            Err(ResolveError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn non_object_config_document_is_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("config.json", r#"[1, 2, 3]"#);
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "config-file", "attrs": {"src": "config.json"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        assert!(matches!(
            shell.resolve().await,
            Err(ResolveError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_manifest_is_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("pages/index.json", r#"{"not": "an array"}"#);
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "pagesDir", "value": "pages"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        assert!(matches!(
            shell.resolve().await,
            Err(ResolveError::Manifest { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_first_page_is_a_conflict() {
        let transport = Arc::new(MockTransport::new());
        transport.stage_json(
            "pages/index.json",
            &json!([
                {"path": "a.json", "name": "a", "firstPage": true},
                {"path": "b.json", "name": "b", "firstPage": true}
            ]),
        );
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "pagesDir", "value": "pages"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        assert!(matches!(
            shell.resolve().await,
            Err(ResolveError::Conflict(_))
        ));
        // No navigation happened.
        assert!(shell.current_page().is_none());
    }

    #[tokio::test]
    async fn pages_manifest_registers_and_navigates_first_page() {
        let transport = Arc::new(MockTransport::new());
        transport.stage_json(
            "pages/index.json",
            &json!([
                {"path": "home.json", "name": "home", "firstPage": true},
                {"path": "about.json", "name": "about"}
            ]),
        );
        transport.stage(
            "pages/home.json",
            r#"{"tag": "page", "children": [{"tag": "body"}]}"#,
        );
        transport.stage(
            "pages/about.json",
            r#"{"tag": "page", "children": [{"tag": "body"}]}"#,
        );
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "pagesDir", "value": "pages"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport, root);

        shell.resolve().await.unwrap();

        let pages = shell.pages();
        assert!(pages.contains("home"));
        assert!(pages.contains("about"));
        let current = shell.current_page().unwrap();
        assert_eq!(current.fragment_name(), "home");
    }

    #[tokio::test]
    async fn modules_manifest_registers_and_autoloads() {
        let transport = Arc::new(MockTransport::new());
        transport.stage_json(
            "modules/index.json",
            &json!([
                {"path": "nav.json", "name": "nav", "autoload": true},
                {"path": "footer.json", "name": "footer"}
            ]),
        );
        transport.stage(
            "modules/nav.json",
            r#"{"tag": "module", "children": [{"tag": "body"}]}"#,
        );
        let root = app_root(
            r#"{"tag": "app", "children": [
                {"tag": "config", "children": [
                    {"tag": "property", "attrs": {"name": "modulesDir", "value": "modules"}}
                ]}
            ]}"#,
        );
        let shell = shell_with_root(transport.clone(), root);

        shell.resolve().await.unwrap();

        let modules = shell.modules();
        assert!(modules.contains("nav"));
        assert!(modules.contains("footer"));

        // The autoload is fire-and-forget; give the spawned task a chance
        // to run.
        for _ in 0..10 {
            if modules.get("nav").unwrap().is_loaded() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(modules.get("nav").unwrap().is_loaded());
        assert!(!modules.get("footer").unwrap().is_loaded());
    }

    #[tokio::test]
    async fn second_pass_rejects_while_first_is_in_flight() {
        let transport = Arc::new(MockTransport::new());
        let root = app_root(r#"{"tag": "app", "children": [{"tag": "config"}]}"#);
        let shell = shell_with_root(transport, root);

        shell.inner.resolving.store(true, Ordering::SeqCst);
        assert!(matches!(
            shell.resolve().await,
            Err(ResolveError::InFlight)
        ));
        shell.inner.resolving.store(false, Ordering::SeqCst);
        shell.resolve().await.unwrap();
    }
}
