//! # Shared Bus - Connection Plumbing for the Stock Quotes Feed
//!
//! Everything both feed processes need to talk over an unreliable,
//! connection-oriented message bus.
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `transport` | `Transport` / `InboundListener` port, `TransportError` |
//! | `pool` | `MessagePool` of reusable outbound envelopes |
//! | `handler` | `BusHandler`: pooled encoding of requests and bus messages |
//! | `supervisor` | `ReconnectSupervisor` with generation-based cancellation |
//! | `memory` | `InMemoryBroker` / `InMemoryTransport` for single-process runs |
//!
//! ## Topology
//!
//! ```text
//! ┌──────────────┐   request queue (text)   ┌──────────────┐
//! │ Feed adapter │ ───────────────────────► │  Generator   │
//! │              │ ◄─────────────────────── │              │
//! └──────────────┘   update topic (JSON)    └──────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod handler;
pub mod memory;
pub mod pool;
pub mod supervisor;
pub mod transport;

// Re-export main types
pub use handler::{BusHandler, DEFAULT_POOL_BATCH};
pub use memory::{InMemoryBroker, InMemoryTransport, Role};
pub use pool::{Envelope, MessagePool, PoolError, Recycle};
pub use supervisor::{
    GenerationCounter, GenerationToken, ReconnectSupervisor, SupervisorOutcome,
    DEFAULT_RECOVERY_PAUSE,
};
pub use transport::{Channel, InboundListener, Transport, TransportError};

/// Maximum payloads buffered per in-memory channel before receivers lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default name of the request queue.
pub const DEFAULT_QUEUE_NAME: &str = "stocksQueue";

/// Default name of the update topic.
pub const DEFAULT_TOPIC_NAME: &str = "stocksTopic";
