//! Domain layer for the feed adapter.
//!
//! Pure state and rules; no I/O, no tasks.

pub mod inactive;
pub mod liveness;
pub mod registry;
pub mod subscription;

pub use inactive::{inactive_delta, inactive_snapshot};
pub use liveness::{EpochObservation, FeedStatus, LivenessState};
pub use registry::{AdapterState, RequestQueue, SubscriptionRegistry};
pub use subscription::Subscription;
