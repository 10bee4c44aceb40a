//! Subscription registry and the pending-request queue.
//!
//! Both live inside `AdapterState`, which the service keeps behind a single
//! reader/writer lock: every mutation of the registry and every enqueue
//! happen under the write lock, so the order of requests in the queue always
//! matches the order of registry changes.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;
use shared_types::{ControlRequest, ItemName, SubscriptionId};

use super::liveness::LivenessState;
use super::subscription::Subscription;

/// At most one live subscription per item.
#[derive(Debug)]
pub struct SubscriptionRegistry<H> {
    items: BTreeMap<ItemName, Subscription<H>>,
    next_id: u64,
}

impl<H> Default for SubscriptionRegistry<H> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<H> SubscriptionRegistry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under a fresh id, replacing any previous entry.
    ///
    /// Returns the new id and the replaced subscription, if any.
    pub fn insert(&mut self, item: ItemName, handle: H) -> (SubscriptionId, Option<Subscription<H>>) {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let replaced = self.items.insert(item, Subscription::new(id, handle));
        (id, replaced)
    }

    pub fn remove(&mut self, item: &ItemName) -> Option<Subscription<H>> {
        self.items.remove(item)
    }

    #[must_use]
    pub fn get(&self, item: &ItemName) -> Option<&Subscription<H>> {
        self.items.get(item)
    }

    /// Subscriptions in item-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemName, &Subscription<H>)> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// FIFO of control requests waiting to be sent.
///
/// Pops are atomic, so several dispatch rounds may drain it concurrently
/// under the shared lock without sending any request twice.
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: Mutex<VecDeque<ControlRequest>>,
}

impl RequestQueue {
    pub fn push(&self, request: ControlRequest) {
        self.requests.lock().push_back(request);
    }

    pub fn pop(&self) -> Option<ControlRequest> {
        self.requests.lock().pop_front()
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Copy of the queued requests, front first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ControlRequest> {
        self.requests.lock().iter().cloned().collect()
    }
}

/// Everything guarded by the adapter's reader/writer lock.
#[derive(Debug)]
pub struct AdapterState<H> {
    pub registry: SubscriptionRegistry<H>,
    pub pending: RequestQueue,
    pub liveness: LivenessState,
}

impl<H> Default for AdapterState<H> {
    fn default() -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            pending: RequestQueue::default(),
            liveness: LivenessState::new(),
        }
    }
}

impl<H> AdapterState<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the generator's view from scratch after a new producer run.
    ///
    /// Any request still queued refers to the previous run and is dropped.
    /// Snapshot flags are cleared so that the new run's first update for
    /// each item is delivered as its snapshot.
    pub fn resubscribe_all(&mut self) {
        self.pending.clear();
        self.pending.push(ControlRequest::Reset);

        for (item, subscription) in self.registry.iter() {
            subscription.reset_snapshot();
            self.pending.push(ControlRequest::Subscribe {
                item: item.clone(),
                id: subscription.id(),
            });
        }
    }
}
