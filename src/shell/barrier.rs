//! shell::barrier
//!
//! Commit barriers between navigation steps.
//!
//! # Design
//!
//! The transition choreography is a three-step attribute state machine, and
//! each step must be *committed* — observed by the host — before the next
//! mutation batch runs, or transitions keyed off the intermediate states
//! never fire. The [`CommitBarrier`] trait is the seam: the default
//! [`YieldBarrier`] yields to the scheduler, a rendering host would flush
//! its pipeline, and [`RecordingBarrier`] snapshots the tree so tests can
//! assert on every intermediate state.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dom::{Node, NodeSpec};

/// Barrier guaranteeing the tree's state is committed before the next
/// mutation batch.
#[async_trait]
pub trait CommitBarrier: Send + Sync {
    /// Commit pending state. Called between navigation steps.
    async fn commit(&self);
}

/// Default barrier: yield one scheduling step.
///
/// With no rendering pipeline attached, letting the event loop turn over is
/// the strongest commit available.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldBarrier;

#[async_trait]
impl CommitBarrier for YieldBarrier {
    async fn commit(&self) {
        tokio::task::yield_now().await;
    }
}

/// Barrier that snapshots a subtree at every commit.
///
/// Each commit appends the watched subtree's [`NodeSpec`] to the frame
/// list, giving tests (or a host recording tool) the exact sequence of
/// committed intermediate states.
#[derive(Debug, Clone)]
pub struct RecordingBarrier {
    watched: Node,
    frames: Arc<Mutex<Vec<NodeSpec>>>,
}

impl RecordingBarrier {
    /// Record snapshots of `watched` at each commit.
    pub fn new(watched: Node) -> Self {
        Self {
            watched,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The committed frames, in order.
    pub fn frames(&self) -> Vec<NodeSpec> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommitBarrier for RecordingBarrier {
    async fn commit(&self) {
        let frame = self.watched.to_spec();
        self.frames.lock().unwrap().push(frame);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_barrier_captures_frames() {
        let root = Node::new("app");
        let barrier = RecordingBarrier::new(root.clone());

        root.set_attribute("step", "one");
        barrier.commit().await;
        root.set_attribute("step", "two");
        barrier.commit().await;

        let frames = barrier.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].attrs["step"], "one");
        assert_eq!(frames[1].attrs["step"], "two");
    }

    #[tokio::test]
    async fn yield_barrier_completes() {
        YieldBarrier.commit().await;
    }
}
