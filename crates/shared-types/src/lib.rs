//! # Shared Types Crate
//!
//! This crate contains the entities and wire messages exchanged between the
//! feed adapter (consumer side) and the feed generator (producer side).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Both processes encode and decode through the
//!   types defined here, so the two ends of the bus can never disagree on
//!   the wire format.
//! - **Validated Identity**: An `ItemName` can only be obtained through
//!   `ItemName::parse`, which enforces the `item1`..`item30` rule.
//! - **Sentinel-free Epochs**: "No producer" is `Option::<ProducerEpoch>::None`,
//!   never a magic epoch value.
//!
//! ## Wire Formats
//!
//! | Channel | Direction | Format |
//! |---------|-----------|--------|
//! | Request queue | adapter → generator | `reset`, `subscribe<item>_<id>`, `unsubscribe<item>_<id>` |
//! | Update topic | generator → adapter | JSON `BusMessage` (heartbeat or field update) |

pub mod control;
pub mod entities;
pub mod errors;
pub mod message;

pub use control::ControlRequest;
pub use entities::*;
pub use errors::*;
pub use message::{BusMessage, FeedMessage};
