//! # Stock Quotes Feed Test Suite
//!
//! End-to-end scenarios running a real generator and a real adapter over
//! the in-memory broker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs   # Deployment builder, recording consumer
//!     ├── delivery.rs   # Snapshot-once, unsubscribe
//!     ├── liveness.rs   # Producer restarts and stalls
//!     └── recovery.rs   # Broker outages
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sq-tests
//! cargo test -p sq-tests integration::recovery::
//! ```

#![allow(dead_code)]

pub mod integration;
