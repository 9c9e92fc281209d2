//! shell::navigate
//!
//! The navigation engine: swaps the visible page through an ordered
//! attribute state machine.
//!
//! # Choreography
//!
//! With `useTransitions` set, a navigation runs three mutation batches,
//! each separated by a commit barrier:
//!
//! ```text
//! Step 1: incoming content enters tagged `next`,
//!         placed immediately after the outgoing content   | commit
//! Step 2: outgoing tagged `previous`,
//!         incoming loses `next` and gains `main`          | commit
//! Step 3: outgoing content removed, instance retired
//! ```
//!
//! The barriers are load-bearing: hosts key transitions off the
//! intermediate attribute states, which must be committed before the next
//! batch mutates them away. With transitions disabled, the swap is a single
//! batch with no intermediate tags.
//!
//! # Invariants
//!
//! - A failed navigation (unknown page, unloaded fragment) leaves the
//!   current page untouched.
//! - Navigating with no previous page never attempts to remove one.
//! - A retired instance is released from its fragment's instance list.

use thiserror::Error;

use super::{LifecycleEvent, Shell};
use crate::core::types::{FragmentKind, StateTag};
use crate::dom::DomError;
use crate::fragment::{Fragment, FragmentError, FragmentInstance};

/// Errors from navigation.
#[derive(Debug, Error)]
pub enum NavigateError {
    /// No page with this name is registered.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// The target fragment is not a page.
    #[error("cannot navigate to {kind} '{name}'")]
    NotAPage {
        /// The fragment's name.
        name: String,
        /// The fragment's actual kind.
        kind: FragmentKind,
    },

    /// Spawning the new page instance failed (typically not loaded yet).
    #[error(transparent)]
    Fragment(#[from] FragmentError),

    /// A tree mutation failed.
    #[error("tree mutation failed: {0}")]
    Dom(#[from] DomError),
}

/// A navigation target: a registered page name or a page object directly.
#[derive(Debug, Clone)]
pub enum NavTarget {
    /// Resolve via the page registry.
    Name(String),
    /// Navigate to this page fragment.
    Page(Fragment),
}

impl From<&str> for NavTarget {
    fn from(name: &str) -> Self {
        NavTarget::Name(name.to_string())
    }
}

impl From<String> for NavTarget {
    fn from(name: String) -> Self {
        NavTarget::Name(name)
    }
}

impl From<Fragment> for NavTarget {
    fn from(page: Fragment) -> Self {
        NavTarget::Page(page)
    }
}

impl From<&Fragment> for NavTarget {
    fn from(page: &Fragment) -> Self {
        NavTarget::Page(page.clone())
    }
}

impl Shell {
    /// Navigate to a page, making a fresh instance of it the visible page.
    ///
    /// # Errors
    ///
    /// - [`NavigateError::PageNotFound`] when a name does not resolve
    /// - [`NavigateError::NotAPage`] when the target fragment is a module
    /// - [`NavigateError::Fragment`] when the target page is not loaded
    ///
    /// All failures leave the current page unchanged.
    pub async fn navigate(&self, target: impl Into<NavTarget>) -> Result<(), NavigateError> {
        let page = match target.into() {
            NavTarget::Name(name) => {
                let found = self.inner.pages.lock().unwrap().get(&name);
                found.ok_or(NavigateError::PageNotFound(name))?
            }
            NavTarget::Page(fragment) => {
                if fragment.kind() != FragmentKind::Page {
                    return Err(NavigateError::NotAPage {
                        name: fragment.name().to_string(),
                        kind: fragment.kind(),
                    });
                }
                fragment
            }
        };

        let use_transitions = self.inner.config.lock().unwrap().use_transitions();

        // Instance first: if the page is not loaded this fails before any
        // visible state changes.
        let incoming = page.new_instance(None)?;
        let previous = self.rotate_slots(incoming.clone());

        let root = self.inner.root.clone();
        let content = incoming.content();

        if use_transitions {
            // Step 1: enter tagged `next`, positioned after the outgoing
            // content (or appended when there is none).
            content.set_attribute(StateTag::Next.attr(), "");
            match previous.as_ref().map(FragmentInstance::content) {
                Some(outgoing) if outgoing.parent().is_some() => {
                    outgoing.insert_after(&content)?;
                }
                _ => root.append_child(&content)?,
            }
            self.inner.barrier.commit().await;

            // Step 2: rotate the state tags.
            if let Some(outgoing) = &previous {
                outgoing.content().set_attribute(StateTag::Previous.attr(), "");
                self.notify(LifecycleEvent::PageBeforeUnload {
                    page: outgoing.fragment_name().to_string(),
                });
            }
            content.remove_attribute(StateTag::Next.attr());
            content.set_attribute(StateTag::Main.attr(), "");
            self.notify(LifecycleEvent::PageLoad {
                page: incoming.fragment_name().to_string(),
            });
            self.inner.barrier.commit().await;

            // Step 3: remove the outgoing page.
            if let Some(outgoing) = &previous {
                outgoing.content().detach();
                retire(outgoing);
            }
        } else {
            // Instant swap. The previous page may not exist; only remove
            // what is actually there.
            if let Some(outgoing) = &previous {
                self.notify(LifecycleEvent::PageBeforeUnload {
                    page: outgoing.fragment_name().to_string(),
                });
                outgoing.content().detach();
                retire(outgoing);
            }
            root.append_child(&content)?;
            self.notify(LifecycleEvent::PageLoad {
                page: incoming.fragment_name().to_string(),
            });
        }

        self.finish_transition();
        Ok(())
    }
}

/// Release a retired instance from its fragment's history.
fn retire(instance: &FragmentInstance) {
    if let Some(fragment) = instance.fragment() {
        fragment.release_instance(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::key;
    use crate::shell::{RecordingBarrier, RecordingObserver};
    use crate::transport::MockTransport;
    use std::sync::Arc;

    fn page_doc(id: &str) -> String {
        format!(
            r#"{{"tag": "page", "children": [
                {{"tag": "body", "children": [{{"tag": "section", "attrs": {{"id": "{id}"}}}}]}}
            ]}}"#
        )
    }

    async fn shell_with_pages(use_transitions: bool) -> (Shell, RecordingBarrier) {
        let transport = Arc::new(MockTransport::new());
        transport.stage("pages/alpha.json", page_doc("alpha"));
        transport.stage("pages/beta.json", page_doc("beta"));

        let root = crate::dom::Node::new("app");
        let barrier = RecordingBarrier::new(root.clone());
        let shell = Shell::builder("demo", transport.clone())
            .root(root)
            .barrier(Arc::new(barrier.clone()))
            .build();

        if use_transitions {
            shell
                .inner
                .config
                .lock()
                .unwrap()
                .set(key::USE_TRANSITIONS, serde_json::json!(true));
        }

        for name in ["alpha", "beta"] {
            let page = Fragment::page(
                name,
                format!("pages/{name}.json"),
                transport.clone(),
                None,
            );
            page.load().await.unwrap();
            shell.add_to_cache(&page).unwrap();
        }
        (shell, barrier)
    }

    fn visible_pages(shell: &Shell) -> Vec<String> {
        shell
            .root()
            .children()
            .into_iter()
            .filter(|n| n.tag() == "body")
            .filter_map(|n| n.attribute("fragment"))
            .collect()
    }

    #[tokio::test]
    async fn unknown_name_fails_and_leaves_current() {
        let (shell, _) = shell_with_pages(false).await;
        shell.navigate("alpha").await.unwrap();
        let current = shell.current_page().unwrap();

        let result = shell.navigate("missing").await;
        assert!(matches!(result, Err(NavigateError::PageNotFound(_))));
        assert!(shell.current_page().unwrap().same_instance(&current));
        assert_eq!(visible_pages(&shell), vec!["alpha"]);
    }

    #[tokio::test]
    async fn unloaded_page_fails_and_leaves_current() {
        let (shell, _) = shell_with_pages(false).await;
        shell.navigate("alpha").await.unwrap();
        let current = shell.current_page().unwrap();

        let transport = Arc::new(MockTransport::new());
        let unloaded = Fragment::page("late", "pages/late.json", transport, None);
        let result = shell.navigate(&unloaded).await;

        assert!(matches!(
            result,
            Err(NavigateError::Fragment(FragmentError::NotLoaded(_)))
        ));
        assert!(shell.current_page().unwrap().same_instance(&current));
    }

    #[tokio::test]
    async fn module_target_is_rejected() {
        let (shell, _) = shell_with_pages(false).await;
        let transport = Arc::new(MockTransport::new());
        let module = Fragment::module("nav", "modules/nav.json", transport, None);

        assert!(matches!(
            shell.navigate(&module).await,
            Err(NavigateError::NotAPage { .. })
        ));
    }

    #[tokio::test]
    async fn instant_navigation_has_no_intermediate_tags() {
        let (shell, barrier) = shell_with_pages(false).await;

        // First navigation: no previous page to remove.
        shell.navigate("alpha").await.unwrap();
        assert_eq!(visible_pages(&shell), vec!["alpha"]);

        shell.navigate("beta").await.unwrap();
        assert_eq!(visible_pages(&shell), vec!["beta"]);

        // No barrier commits ran, so no intermediate states existed.
        assert!(barrier.frames().is_empty());
        let beta = shell.current_page().unwrap().content();
        assert!(!beta.has_attribute("next"));
        assert!(!beta.has_attribute("previous"));
        assert!(shell.previous_page().is_none());
    }

    #[tokio::test]
    async fn choreographed_navigation_commits_three_states() {
        let (shell, barrier) = shell_with_pages(true).await;

        shell.navigate("alpha").await.unwrap();
        shell.navigate("beta").await.unwrap();

        let frames = barrier.frames();
        // Two navigations, two commits each.
        assert_eq!(frames.len(), 4);

        let find = |frame: &crate::dom::NodeSpec, fragment: &str| {
            frame
                .children
                .iter()
                .find(|c| {
                    c.tag == "body"
                        && c.attrs.get("fragment").map(String::as_str) == Some(fragment)
                })
                .cloned()
        };

        // Second navigation, step 1: beta entered tagged `next`, after alpha.
        let step1 = &frames[2];
        let alpha = find(step1, "alpha").unwrap();
        let beta = find(step1, "beta").unwrap();
        assert!(beta.attrs.contains_key("next"));
        assert!(!beta.attrs.contains_key("main"));
        assert!(alpha.attrs.contains_key("main"));
        assert!(!alpha.attrs.contains_key("previous"));
        let alpha_pos = step1.children.iter().position(|c| {
            c.attrs.get("fragment").map(String::as_str) == Some("alpha")
        });
        let beta_pos = step1.children.iter().position(|c| {
            c.attrs.get("fragment").map(String::as_str) == Some("beta")
        });
        assert_eq!(beta_pos.unwrap(), alpha_pos.unwrap() + 1);

        // Second navigation, step 2: alpha tagged `previous`, beta settled
        // as `main` with `next` cleared; alpha still attached.
        let step2 = &frames[3];
        let alpha = find(step2, "alpha").unwrap();
        let beta = find(step2, "beta").unwrap();
        assert!(alpha.attrs.contains_key("previous"));
        assert!(beta.attrs.contains_key("main"));
        assert!(!beta.attrs.contains_key("next"));

        // Step 3: alpha's content is gone from the live tree.
        assert_eq!(visible_pages(&shell), vec!["beta"]);
        assert!(shell.previous_page().is_none());
    }

    #[tokio::test]
    async fn first_choreographed_navigation_appends_to_root() {
        let (shell, barrier) = shell_with_pages(true).await;

        shell.navigate("alpha").await.unwrap();

        let frames = barrier.frames();
        assert_eq!(frames.len(), 2);
        let step1_alpha = frames[0]
            .children
            .iter()
            .find(|c| c.tag == "body")
            .unwrap();
        assert!(step1_alpha.attrs.contains_key("next"));
        assert_eq!(visible_pages(&shell), vec!["alpha"]);
    }

    #[tokio::test]
    async fn retired_instances_are_released() {
        let (shell, _) = shell_with_pages(true).await;
        let alpha = shell.pages().get("alpha").unwrap();

        shell.navigate("alpha").await.unwrap();
        assert_eq!(alpha.instance_count(), 1);

        shell.navigate("beta").await.unwrap();
        assert_eq!(alpha.instance_count(), 0);

        // Navigating back spawns a fresh instance.
        shell.navigate("alpha").await.unwrap();
        assert_eq!(alpha.instance_count(), 1);
    }

    #[tokio::test]
    async fn lifecycle_events_fire_in_order() {
        let transport = Arc::new(MockTransport::new());
        transport.stage("pages/alpha.json", page_doc("alpha"));
        transport.stage("pages/beta.json", page_doc("beta"));

        let observer = RecordingObserver::new();
        let shell = Shell::builder("demo", transport.clone())
            .observer(Arc::new(observer.clone()))
            .build();
        for name in ["alpha", "beta"] {
            let page = Fragment::page(
                name,
                format!("pages/{name}.json"),
                transport.clone(),
                None,
            );
            page.load().await.unwrap();
            shell.add_to_cache(&page).unwrap();
        }

        shell.navigate("alpha").await.unwrap();
        shell.navigate("beta").await.unwrap();

        assert_eq!(
            observer.events(),
            vec![
                LifecycleEvent::PageLoad {
                    page: "alpha".into()
                },
                LifecycleEvent::PageBeforeUnload {
                    page: "alpha".into()
                },
                LifecycleEvent::PageLoad {
                    page: "beta".into()
                },
            ]
        );
    }
}
