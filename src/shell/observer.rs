//! shell::observer
//!
//! Lifecycle notifications emitted by the navigation engine.
//!
//! The state tags (`next`, `main`, `previous`) are the attribute half of
//! the contract with host collaborators; these notifications are the event
//! half. Script-execution and rendering collaborators subscribe here to
//! learn when a page has settled as visible and when an outgoing page is
//! about to leave the tree.

use std::sync::{Arc, Mutex};

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The page has settled as the visible page.
    PageLoad {
        /// The page's fragment name.
        page: String,
    },
    /// The outgoing page is about to be removed from the tree.
    PageBeforeUnload {
        /// The page's fragment name.
        page: String,
    },
}

/// Observer of shell lifecycle notifications.
///
/// Implementations must be `Send + Sync`; notification happens inline
/// during navigation, so observers should be quick.
pub trait ShellObserver: Send + Sync {
    /// Receive a lifecycle notification.
    fn notify(&self, event: &LifecycleEvent);
}

/// Observer that records every notification, for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl RecordingObserver {
    /// Create an empty recording observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, in order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ShellObserver for RecordingObserver {
    fn notify(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.notify(&LifecycleEvent::PageBeforeUnload {
            page: "home".into(),
        });
        observer.notify(&LifecycleEvent::PageLoad {
            page: "about".into(),
        });

        assert_eq!(
            observer.events(),
            vec![
                LifecycleEvent::PageBeforeUnload {
                    page: "home".into()
                },
                LifecycleEvent::PageLoad {
                    page: "about".into()
                },
            ]
        );
    }
}
