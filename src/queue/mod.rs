//! Speaker queue.
//!
//! [`SpeakerQueue`] is the ordered waitlist itself: FIFO, one position per
//! member. [`SharedQueue`] pairs it with a [`QueueStore`] behind a single
//! async mutex so that every mutation and the snapshot written for it happen
//! as one critical section.

mod store;

pub use store::QueueStore;

use crate::error::StoreError;
use crate::platform::MemberId;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Result of a join attempt. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    AlreadyQueued(usize),
    Joined(usize),
}

/// Ordered waitlist of members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerQueue {
    members: VecDeque<MemberId>,
}

impl SpeakerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from a saved order. Repeated identifiers keep their
    /// first position.
    pub fn from_members(members: impl IntoIterator<Item = MemberId>) -> Self {
        let mut queue = Self::new();
        for member in members {
            queue.join(member);
        }
        queue
    }

    /// Append `member` unless already queued.
    pub fn join(&mut self, member: MemberId) -> JoinOutcome {
        if let Some(pos) = self.position(&member) {
            return JoinOutcome::AlreadyQueued(pos);
        }
        self.members.push_back(member);
        JoinOutcome::Joined(self.members.len())
    }

    /// Pop the front member, if any.
    pub fn advance(&mut self) -> Option<MemberId> {
        self.members.pop_front()
    }

    /// Up to `n` members from the front, in order.
    pub fn peek_next(&self, n: usize) -> impl Iterator<Item = &MemberId> {
        self.members.iter().take(n)
    }

    /// 1-based position of `member`.
    pub fn position(&self, member: &MemberId) -> Option<usize> {
        self.members.iter().position(|m| m == member).map(|i| i + 1)
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.members.iter()
    }
}

/// What an advance produced, captured under the same lock as the pop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// The member popped from the front, `None` when the queue was empty.
    pub next: Option<MemberId>,
    /// Queue status right after the pop.
    pub status: QueueStatus,
}

/// Point-in-time summary of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub size: usize,
    pub upcoming: Vec<MemberId>,
}

impl QueueStatus {
    fn of(queue: &SpeakerQueue, upcoming: usize) -> Self {
        Self {
            size: queue.size(),
            upcoming: queue.peek_next(upcoming).cloned().collect(),
        }
    }
}

/// Speaker queue shared between the event consumer and the advance timer.
#[derive(Debug, Clone)]
pub struct SharedQueue {
    inner: Arc<Mutex<SpeakerQueue>>,
    store: Arc<QueueStore>,
}

impl SharedQueue {
    /// Load the saved queue from `store`, falling back to an empty queue.
    pub async fn load(store: QueueStore) -> Self {
        let saved = store.load().await;
        let queue = SpeakerQueue::from_members(saved);
        info!(
            path = %store.path().display(),
            size = queue.size(),
            "Loaded speaker queue"
        );
        Self {
            inner: Arc::new(Mutex::new(queue)),
            store: Arc::new(store),
        }
    }

    /// Join the queue, persisting when the member was newly added.
    ///
    /// A failed write is logged; the in-memory queue stays authoritative.
    pub async fn join(&self, member: MemberId) -> JoinOutcome {
        let mut queue = self.inner.lock().await;
        let outcome = queue.join(member);
        if matches!(outcome, JoinOutcome::Joined(_)) {
            self.save_locked(&queue).await;
        }
        outcome
    }

    /// Pop the front member and report what is left, `upcoming` members deep.
    pub async fn advance(&self, upcoming: usize) -> Advance {
        let mut queue = self.inner.lock().await;
        let next = queue.advance();
        if next.is_some() {
            self.save_locked(&queue).await;
        }
        Advance {
            next,
            status: QueueStatus::of(&queue, upcoming),
        }
    }

    pub async fn status(&self, upcoming: usize) -> QueueStatus {
        let queue = self.inner.lock().await;
        QueueStatus::of(&queue, upcoming)
    }

    /// Write the current queue to the store.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let queue = self.inner.lock().await;
        self.store.save(queue.iter()).await
    }

    pub async fn snapshot(&self) -> Vec<MemberId> {
        self.inner.lock().await.iter().cloned().collect()
    }

    async fn save_locked(&self, queue: &SpeakerQueue) {
        if let Err(e) = self.store.save(queue.iter()).await {
            warn!(
                path = %self.store.path().display(),
                error = %e,
                code = e.error_code(),
                "Failed to persist speaker queue"
            );
        }
    }
}
