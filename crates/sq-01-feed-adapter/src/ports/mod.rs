//! Ports layer for the feed adapter.
//!
//! ## Hexagonal Architecture
//!
//! - **Inbound Ports**: `DataProvider` (subscribe / unsubscribe)
//! - **Outbound Ports**: `ItemEventListener` (consumer callback), plus the
//!   `shared_bus::Transport` the adapter talks to the generator through

pub mod inbound;
pub mod outbound;

pub use inbound::DataProvider;
pub use outbound::ItemEventListener;
