//! # Feed Runtime Library
//!
//! Wiring of both ends of the feed inside one process. The `main.rs` binary
//! is a thin shell around `FeedRuntime`.

pub mod config;
pub mod consumer;
pub mod error;
pub mod wiring;

pub use config::RuntimeConfig;
pub use consumer::LoggingConsumer;
pub use error::{ConfigError, RuntimeError};
pub use wiring::FeedRuntime;
