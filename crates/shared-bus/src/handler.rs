//! # Bus Handler
//!
//! Wraps a `Transport` with the two outbound encoders used by the feed:
//! control requests (text) and bus messages (JSON). Each encoder writes into
//! an envelope taken from its own `MessagePool`, so steady-state sending does
//! not allocate.

use std::io::Write;
use std::sync::{Arc, Weak};

use shared_types::{BusMessage, ControlRequest};
use tracing::{debug, error};

use crate::pool::{Envelope, MessagePool, PoolError};
use crate::transport::{Channel, InboundListener, Transport, TransportError};

/// Default number of envelopes added to a pool when it runs dry.
pub const DEFAULT_POOL_BATCH: usize = 15;

/// Pooled outbound encoding on top of a transport.
pub struct BusHandler {
    transport: Arc<dyn Transport>,
    requests: MessagePool<Vec<u8>>,
    updates: MessagePool<Vec<u8>>,
}

impl BusHandler {
    /// Create a handler whose pools grow by `pool_batch` envelopes.
    ///
    /// # Errors
    ///
    /// `PoolError::EmptyBatch` if `pool_batch` is zero.
    pub fn new(transport: Arc<dyn Transport>, pool_batch: usize) -> Result<Self, PoolError> {
        Ok(Self {
            transport,
            requests: MessagePool::new("requests", pool_batch)?,
            updates: MessagePool::new("updates", pool_batch)?,
        })
    }

    /// Open a session on the underlying transport.
    pub async fn connect(&self) -> Result<(), TransportError> {
        self.transport.connect().await
    }

    /// Close the current session, if any.
    pub fn reset(&self) {
        self.transport.reset();
    }

    /// Register the receiver of inbound traffic.
    pub fn set_listener(&self, listener: Weak<dyn InboundListener>) {
        self.transport.set_listener(listener);
    }

    /// Send a control request on the request queue.
    pub fn send_request(&self, request: &ControlRequest) -> Result<(), TransportError> {
        let mut envelope = self.requests.acquire();
        let result = write!(&mut *envelope, "{request}")
            .map_err(|e| TransportError::Encode(e.to_string()))
            .and_then(|()| self.transport.send(Channel::Requests, &envelope));
        Self::give_back(&self.requests, envelope);

        if result.is_ok() {
            debug!(request = %request, "Control request sent");
        }
        result
    }

    /// Publish a heartbeat or update on the update topic.
    pub fn publish(&self, message: &BusMessage) -> Result<(), TransportError> {
        let mut envelope = self.updates.acquire();
        let result = message
            .encode_into(&mut envelope)
            .map_err(|e| TransportError::Encode(e.to_string()))
            .and_then(|()| self.transport.send(Channel::Updates, &envelope));
        Self::give_back(&self.updates, envelope);
        result
    }

    /// Pool backing control requests.
    #[must_use]
    pub fn request_pool(&self) -> &MessagePool<Vec<u8>> {
        &self.requests
    }

    /// Pool backing published bus messages.
    #[must_use]
    pub fn update_pool(&self) -> &MessagePool<Vec<u8>> {
        &self.updates
    }

    fn give_back(pool: &MessagePool<Vec<u8>>, envelope: Envelope<Vec<u8>>) {
        if let Err(e) = pool.release(envelope) {
            error!(error = %e, "Failed to return envelope to pool");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Transport double recording every sent payload.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<(Channel, Vec<u8>)>>,
        pub resets: Mutex<usize>,
        pub fail_sends: Mutex<bool>,
    }

    impl RecordingTransport {
        pub fn sent_text(&self, channel: Channel) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .filter(|(c, _)| *c == channel)
                .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn reset(&self) {
            *self.resets.lock() += 1;
        }

        fn send(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
            if *self.fail_sends.lock() {
                return Err(TransportError::NotReady);
            }
            self.sent.lock().push((channel, payload.to_vec()));
            Ok(())
        }

        fn set_listener(&self, _listener: Weak<dyn InboundListener>) {}
    }
}
