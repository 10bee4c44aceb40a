//! A consumer's interest in one item.

use std::sync::atomic::{AtomicBool, Ordering};

use shared_types::SubscriptionId;

/// One live subscription, keyed by item in the registry.
///
/// The consumer handle is held and handed back on every update, never
/// inspected.
#[derive(Debug)]
pub struct Subscription<H> {
    id: SubscriptionId,
    handle: H,
    snapshot_sent: AtomicBool,
}

impl<H> Subscription<H> {
    #[must_use]
    pub fn new(id: SubscriptionId, handle: H) -> Self {
        Self {
            id,
            handle,
            snapshot_sent: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    #[must_use]
    pub fn snapshot_sent(&self) -> bool {
        self.snapshot_sent.load(Ordering::Acquire)
    }

    /// Record that an update is about to be delivered.
    ///
    /// Returns `true` for exactly one caller between two resets: the one
    /// whose update becomes the item's snapshot. Safe under a shared lock.
    pub fn claim_snapshot(&self) -> bool {
        !self.snapshot_sent.swap(true, Ordering::AcqRel)
    }

    /// Make the next delivered update a snapshot again.
    pub fn reset_snapshot(&self) {
        self.snapshot_sent.store(false, Ordering::Release);
    }
}
