//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The transport port lives in `shared-bus`; this is the consumer side.

use shared_types::FieldMap;

/// Receiver of item updates.
///
/// Called while the adapter holds its state lock (shared for producer
/// updates, exclusive for inactive updates). Implementations must return
/// promptly and must not call back into the adapter on the same thread.
pub trait ItemEventListener: Send + Sync + 'static {
    /// Opaque per-subscription handle supplied at subscribe time.
    type Handle: Send + Sync + 'static;

    /// One update for the subscription identified by `handle`.
    fn on_update(&self, handle: &Self::Handle, fields: &FieldMap, is_snapshot: bool);
}
