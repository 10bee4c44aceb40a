//! # sq-02-feed-generator
//!
//! Producer-side end of the stock quotes feed.
//!
//! ## Overview
//!
//! - **Control requests**: `reset`, `subscribe<item>_<id>` and
//!   `unsubscribe<item>_<id>` arrive on the request queue
//! - **Snapshot gate**: every subscription gets exactly one snapshot, deltas
//!   for it are withheld until then
//! - **Heartbeats**: published every second, tagged with the epoch of this
//!   producer run
//! - **Quote simulation**: a random walk over `item1`..`item30`
//!
//! A lost bus connection drops every subscription; the consumer replays
//! them once it hears the next heartbeat.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod simulator;

pub use config::GeneratorConfig;
pub use ports::FeedListener;
pub use service::Generator;
pub use simulator::FeedSimulator;
