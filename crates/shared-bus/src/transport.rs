//! # Transport Port
//!
//! The seam between the feed components and a concrete message bus.
//!
//! A transport owns at most one session at a time. `connect` opens it,
//! `reset` tears it down, and inbound traffic is pushed to the registered
//! `InboundListener` one message at a time.

use std::sync::Weak;

use async_trait::async_trait;
use thiserror::Error;

/// The two destinations shared by adapter and generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Point-to-point queue carrying control requests to the generator.
    Requests,
    /// Publish/subscribe topic carrying heartbeats and updates.
    Updates,
}

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The bus cannot be reached; retry later.
    #[error("Bus not reachable: {0}")]
    Unreachable(String),

    /// A destination name is not (yet) known to the bus; retry later.
    #[error("Destination name not valid: {0}")]
    InvalidEndpoint(String),

    /// No session is open.
    #[error("Transport session not ready")]
    NotReady,

    /// The bus refused the message.
    #[error("Send failed: {0}")]
    Failure(String),

    /// An open session was lost.
    #[error("Connection lost")]
    ConnectionLost,

    /// The outbound message could not be encoded.
    #[error("Failed to encode outbound message: {0}")]
    Encode(String),
}

/// Receiver of inbound traffic and asynchronous session failures.
///
/// Calls for one session are serialized: a listener never sees two
/// concurrent `on_message` calls from the same transport.
pub trait InboundListener: Send + Sync {
    /// A raw payload arrived on the channel this endpoint listens to.
    fn on_message(&self, payload: &[u8]);

    /// The open session failed after `connect` had succeeded.
    fn on_transport_error(&self, error: TransportError);
}

/// A connection-oriented message bus endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session. Fails with `Unreachable` or `InvalidEndpoint` while
    /// the bus is not usable.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Close the current session, if any. Idempotent.
    fn reset(&self);

    /// Send `payload` on `channel` through the open session.
    fn send(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError>;

    /// Register the receiver of inbound traffic for future sessions.
    fn set_listener(&self, listener: Weak<dyn InboundListener>);
}
