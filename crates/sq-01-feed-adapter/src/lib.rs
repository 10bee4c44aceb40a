//! # sq-01-feed-adapter
//!
//! Consumer-side end of the stock quotes feed.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Subscription registry**: one live subscription per item, ids assigned
//!   locally and echoed back by the generator
//! - **Liveness detection**: heartbeat-driven, tells a dead producer from a
//!   dead bus
//! - **Snapshot-once delivery**: the first update a subscription sees is its
//!   snapshot, whatever the producer claims
//! - **Transparent recovery**: bus loss and producer restarts end in a full
//!   re-subscription without duplicating state
//!
//! ## Architecture
//!
//! ```text
//! Consumer ──subscribe/unsubscribe──→ FeedAdapter ──control requests──→ Generator
//!    ↑                                    │  ↑
//!    └────────── on_update ───────────────┘  └──── heartbeats / updates ─────┘
//! ```
//!
//! ## Feed availability as seen by the consumer
//!
//! | Situation | Consumer receives |
//! |-----------|-------------------|
//! | subscribe while feed down | inactive snapshot |
//! | producer silent for one watchdog interval | inactive update per item |
//! | bus connection lost | inactive update per item |
//! | producer (re)appears | fresh snapshot per item, then deltas |
//!
//! ## Example
//!
//! ```rust,ignore
//! use sq_01_feed_adapter::{AdapterConfig, DataProvider, FeedAdapter};
//!
//! let adapter = FeedAdapter::new(AdapterConfig::default(), transport, listener, handle)?;
//! adapter.start();
//! let id = adapter.subscribe("item5", my_handle)?;
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::AdapterConfig;
pub use domain::{inactive_delta, inactive_snapshot, FeedStatus};
pub use error::{SubscriptionError, SubscriptionResult};
pub use ports::{DataProvider, ItemEventListener};
pub use service::FeedAdapter;
