//! Error types for the feed adapter

use shared_types::ItemError;
use thiserror::Error;

/// Caller-contract violations reported to the consumer.
///
/// Bus and producer failures never surface here; they become inactive
/// updates instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The item name does not follow the `item<1..=30>` rule.
    #[error("(Subscribing) {0}")]
    InvalidItem(#[from] ItemError),

    /// Unsubscribe for an item with no live subscription.
    #[error("(Unsubscribing) Unexpected item: {item}")]
    NotSubscribed { item: String },
}

/// Result type for subscription operations
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;
