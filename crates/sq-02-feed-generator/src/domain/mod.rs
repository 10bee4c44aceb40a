//! Domain layer for the feed generator.

pub mod quote;
pub mod registry;

pub use quote::{StockQuote, STOCK_NAMES};
pub use registry::{GateDecision, ProducerRegistry, UnsubscribeOutcome};
