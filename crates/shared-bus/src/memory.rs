//! # In-Memory Broker
//!
//! A process-local bus with the same failure modes as a networked broker.
//!
//! Uses `tokio::sync::broadcast` for the request queue and the update topic.
//! The broker can be taken down and brought back up at runtime; taking it
//! down ends every open session with `ConnectionLost`, exactly like a
//! dropped broker connection.
//!
//! ```text
//!   adapter endpoint                         generator endpoint
//!   ───────────────                          ──────────────────
//!   send(Requests) ──► [ request queue ] ──► forwarder ─► on_message
//!   on_message ◄── forwarder ◄── [ update topic ] ◄── send(Updates)
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transport::{Channel, InboundListener, Transport, TransportError};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Process-local message broker.
pub struct InMemoryBroker {
    requests: broadcast::Sender<Arc<[u8]>>,
    updates: broadcast::Sender<Arc<[u8]>>,
    destinations: RwLock<HashSet<String>>,
    available: AtomicBool,
    /// Bumped every time the broker goes down.
    outages: watch::Sender<u64>,
    messages_routed: AtomicU64,
}

impl InMemoryBroker {
    /// Create an available broker with default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create an available broker with the given channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (requests, _) = broadcast::channel(capacity);
        let (updates, _) = broadcast::channel(capacity);
        let (outages, _) = watch::channel(0);
        Self {
            requests,
            updates,
            destinations: RwLock::new(HashSet::new()),
            available: AtomicBool::new(true),
            outages,
            messages_routed: AtomicU64::new(0),
        }
    }

    /// Make a destination name known to the broker.
    pub fn declare(&self, name: &str) {
        self.destinations.write().insert(name.to_string());
    }

    /// Whether a destination name is known.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.destinations.read().contains(name)
    }

    /// Bring the broker up or take it down.
    ///
    /// Going down ends every open session; connects fail with `Unreachable`
    /// until the broker is available again.
    pub fn set_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::SeqCst);
        if was && !available {
            self.outages.send_modify(|n| *n += 1);
            warn!("In-memory broker down");
        } else if !was && available {
            info!("In-memory broker up");
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Total payloads accepted for routing.
    #[must_use]
    pub fn messages_routed(&self) -> u64 {
        self.messages_routed.load(Ordering::Relaxed)
    }

    fn channel(&self, channel: Channel) -> &broadcast::Sender<Arc<[u8]>> {
        match channel {
            Channel::Requests => &self.requests,
            Channel::Updates => &self.updates,
        }
    }

    fn route(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        if !self.is_available() {
            return Err(TransportError::NotReady);
        }
        self.messages_routed.fetch_add(1, Ordering::Relaxed);

        match self.channel(channel).send(Arc::from(payload)) {
            Ok(receivers) => {
                debug!(channel = ?channel, receivers, "Payload routed");
            }
            Err(_) => {
                // Nobody listening; same as a topic without subscribers.
                debug!(channel = ?channel, "Payload dropped (no receivers)");
            }
        }
        Ok(())
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of the feed an endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends requests, listens to updates.
    Adapter,
    /// Publishes updates, listens to requests.
    Generator,
}

impl Role {
    #[must_use]
    pub fn inbound(self) -> Channel {
        match self {
            Self::Adapter => Channel::Updates,
            Self::Generator => Channel::Requests,
        }
    }

    #[must_use]
    pub fn outbound(self) -> Channel {
        match self {
            Self::Adapter => Channel::Requests,
            Self::Generator => Channel::Updates,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Adapter => "adapter",
            Self::Generator => "generator",
        }
    }
}

struct Session {
    alive: Arc<AtomicBool>,
    forwarder: JoinHandle<()>,
}

/// One endpoint connected to an `InMemoryBroker`.
pub struct InMemoryTransport {
    broker: Arc<InMemoryBroker>,
    role: Role,
    queue_name: String,
    topic_name: String,
    runtime: Handle,
    session: Mutex<Option<Session>>,
    listener: Mutex<Option<Weak<dyn InboundListener>>>,
}

impl InMemoryTransport {
    /// Create an endpoint. Forwarder tasks are spawned on `runtime`.
    #[must_use]
    pub fn new(
        broker: Arc<InMemoryBroker>,
        role: Role,
        queue_name: impl Into<String>,
        topic_name: impl Into<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            broker,
            role,
            queue_name: queue_name.into(),
            topic_name: topic_name.into(),
            runtime,
            session: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Whether a session is open and still alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| s.alive.load(Ordering::SeqCst))
    }

    fn close_session(&self) {
        if let Some(session) = self.session.lock().take() {
            session.alive.store(false, Ordering::SeqCst);
            session.forwarder.abort();
            debug!(role = self.role.label(), "Session closed");
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.broker.is_available() {
            return Err(TransportError::Unreachable(
                "in-memory broker is down".to_string(),
            ));
        }
        for name in [&self.queue_name, &self.topic_name] {
            if !self.broker.is_declared(name) {
                return Err(TransportError::InvalidEndpoint(name.clone()));
            }
        }

        self.close_session();

        let mut inbound = self.broker.channel(self.role.inbound()).subscribe();
        let mut outages = self.broker.outages.subscribe();
        outages.borrow_and_update();

        let listener = self.listener.lock().clone();
        let alive = Arc::new(AtomicBool::new(true));
        let session_alive = alive.clone();
        let role = self.role;

        let forwarder = self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    received = inbound.recv() => match received {
                        Ok(payload) => {
                            match listener.as_ref().and_then(Weak::upgrade) {
                                Some(listener) => listener.on_message(&payload),
                                None => debug!(role = role.label(), "Inbound payload without listener"),
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(count)) => {
                            warn!(role = role.label(), lagged = count, "Listener lagged, payloads dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    changed = outages.changed() => {
                        session_alive.store(false, Ordering::SeqCst);
                        if changed.is_ok() {
                            if let Some(listener) = listener.as_ref().and_then(Weak::upgrade) {
                                listener.on_transport_error(TransportError::ConnectionLost);
                            }
                        }
                        break;
                    }
                }
            }
        });

        *self.session.lock() = Some(Session { alive, forwarder });
        debug!(role = self.role.label(), "Session opened");
        Ok(())
    }

    fn reset(&self) {
        self.close_session();
    }

    fn send(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        if channel != self.role.outbound() {
            return Err(TransportError::Failure(format!(
                "{} endpoint cannot send on {channel:?}",
                self.role.label()
            )));
        }
        if !self.is_connected() {
            return Err(TransportError::NotReady);
        }
        self.broker.route(channel, payload)
    }

    fn set_listener(&self, listener: Weak<dyn InboundListener>) {
        *self.listener.lock() = Some(listener);
    }
}

impl Drop for InMemoryTransport {
    fn drop(&mut self) {
        self.close_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingListener {
        messages: Mutex<Vec<Vec<u8>>>,
        errors: Mutex<Vec<TransportError>>,
    }

    impl InboundListener for RecordingListener {
        fn on_message(&self, payload: &[u8]) {
            self.messages.lock().push(payload.to_vec());
        }

        fn on_transport_error(&self, error: TransportError) {
            self.errors.lock().push(error);
        }
    }

    fn broker() -> Arc<InMemoryBroker> {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare("queue");
        broker.declare("topic");
        broker
    }

    fn endpoint(broker: &Arc<InMemoryBroker>, role: Role) -> InMemoryTransport {
        InMemoryTransport::new(broker.clone(), role, "queue", "topic", Handle::current())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_connect_failures() {
        let broker = Arc::new(InMemoryBroker::new());
        let adapter = endpoint(&broker, Role::Adapter);

        assert!(matches!(
            adapter.connect().await,
            Err(TransportError::InvalidEndpoint(name)) if name == "queue"
        ));

        broker.declare("queue");
        broker.declare("topic");
        broker.set_available(false);
        assert!(matches!(
            adapter.connect().await,
            Err(TransportError::Unreachable(_))
        ));

        broker.set_available(true);
        assert!(adapter.connect().await.is_ok());
        assert!(adapter.is_connected());
    }

    #[tokio::test]
    async fn test_requests_reach_generator() {
        let broker = broker();
        let adapter = endpoint(&broker, Role::Adapter);
        let generator = endpoint(&broker, Role::Generator);

        let listener = Arc::new(RecordingListener::default());
        let weak: Weak<dyn InboundListener> = Arc::downgrade(&listener) as Weak<dyn InboundListener>;
        generator.set_listener(weak);

        generator.connect().await.unwrap();
        adapter.connect().await.unwrap();
        adapter.send(Channel::Requests, b"reset").unwrap();
        settle().await;

        assert_eq!(*listener.messages.lock(), vec![b"reset".to_vec()]);
    }

    #[tokio::test]
    async fn test_send_requires_session_and_role() {
        let broker = broker();
        let adapter = endpoint(&broker, Role::Adapter);

        assert_eq!(
            adapter.send(Channel::Requests, b"reset"),
            Err(TransportError::NotReady)
        );

        adapter.connect().await.unwrap();
        assert!(matches!(
            adapter.send(Channel::Updates, b"{}"),
            Err(TransportError::Failure(_))
        ));

        adapter.reset();
        adapter.reset();
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_outage_notifies_listener_once() {
        let broker = broker();
        let adapter = endpoint(&broker, Role::Adapter);
        let listener = Arc::new(RecordingListener::default());
        adapter.set_listener(Arc::downgrade(&listener) as Weak<dyn InboundListener>);
        adapter.connect().await.unwrap();

        broker.set_available(false);
        settle().await;

        assert_eq!(*listener.errors.lock(), vec![TransportError::ConnectionLost]);
        assert!(!adapter.is_connected());
        assert_eq!(
            adapter.send(Channel::Requests, b"reset"),
            Err(TransportError::NotReady)
        );
    }
}
