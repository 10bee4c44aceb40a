//! Producer-side view of the consumer's subscriptions.

use std::collections::HashMap;

use shared_types::{ItemName, SubscriptionId};

#[derive(Clone, Copy, Debug)]
struct ProducerSubscription {
    id: SubscriptionId,
    snapshot_sent: bool,
}

/// What to do with one simulator event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Nobody subscribed, or the subscription still waits for its snapshot.
    Drop,
    /// Publish, tagged with the subscription id and the corrected flag.
    Publish { id: SubscriptionId, is_snapshot: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Removed,
    NotSubscribed,
    /// The consumer referred to an older subscription; the live one stays.
    Mismatch { current: SubscriptionId },
}

/// Items the consumer subscribed to, keyed by item name.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    items: HashMap<ItemName, ProducerSubscription>,
}

impl ProducerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `item` under `id`. Returns the id it replaces, if any.
    ///
    /// The new subscription owes the consumer a snapshot.
    pub fn subscribe(&mut self, item: ItemName, id: SubscriptionId) -> Option<SubscriptionId> {
        self.items
            .insert(
                item,
                ProducerSubscription {
                    id,
                    snapshot_sent: false,
                },
            )
            .map(|previous| previous.id)
    }

    pub fn unsubscribe(&mut self, item: &ItemName, id: SubscriptionId) -> UnsubscribeOutcome {
        match self.items.get(item) {
            None => UnsubscribeOutcome::NotSubscribed,
            Some(current) if current.id != id => UnsubscribeOutcome::Mismatch {
                current: current.id,
            },
            Some(_) => {
                self.items.remove(item);
                UnsubscribeOutcome::Removed
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, item: &ItemName) -> bool {
        self.items.contains_key(item)
    }

    /// Decide whether a simulator event reaches the bus.
    ///
    /// Until the first snapshot of a subscription has gone out, deltas are
    /// withheld. Once it has, everything is published as a delta.
    pub fn gate(&mut self, item: &ItemName, is_snapshot: bool) -> GateDecision {
        let Some(subscription) = self.items.get_mut(item) else {
            return GateDecision::Drop;
        };

        if subscription.snapshot_sent {
            GateDecision::Publish {
                id: subscription.id,
                is_snapshot: false,
            }
        } else if is_snapshot {
            subscription.snapshot_sent = true;
            GateDecision::Publish {
                id: subscription.id,
                is_snapshot: true,
            }
        } else {
            GateDecision::Drop
        }
    }
}
