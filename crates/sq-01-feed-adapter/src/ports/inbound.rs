//! Driving Ports (API - Inbound)
//!
//! What the consumer calls on the adapter.

use shared_types::SubscriptionId;

use crate::error::SubscriptionResult;

/// Subscription management offered to the consumer.
///
/// `H` is the consumer's opaque handle, returned untouched with every
/// update for the subscription.
pub trait DataProvider<H>: Send + Sync {
    /// Start receiving updates for `item`.
    ///
    /// The first update delivered for the subscription is always flagged as
    /// its snapshot; while the feed is down that is a locally synthesized
    /// inactive snapshot.
    fn subscribe(&self, item: &str, handle: H) -> SubscriptionResult<SubscriptionId>;

    /// Stop receiving updates for `item`.
    fn unsubscribe(&self, item: &str) -> SubscriptionResult<()>;

    /// Whether a snapshot can be produced for `item`.
    ///
    /// Always true: the item schema is known, so an inactive snapshot can be
    /// synthesized even without a producer.
    fn is_snapshot_available(&self, item: &str) -> bool;
}
