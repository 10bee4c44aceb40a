//! Shared test fixtures: a broker with both ends attached and a consumer
//! recording everything it is told.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_bus::{
    InMemoryBroker, InMemoryTransport, Role, Transport, DEFAULT_QUEUE_NAME, DEFAULT_TOPIC_NAME,
};
use shared_types::FieldMap;
use sq_01_feed_adapter::{AdapterConfig, DataProvider, FeedAdapter, ItemEventListener};
use sq_02_feed_generator::{FeedSimulator, Generator, GeneratorConfig};
use tokio::runtime::Handle;

pub const WATCHDOG: Duration = Duration::from_millis(400);

#[derive(Debug, Clone)]
pub struct Event {
    pub handle: String,
    pub fields: FieldMap,
    pub is_snapshot: bool,
}

impl Event {
    pub fn is_inactive(&self) -> bool {
        self.fields.get("item_status").map(String::as_str) == Some("inactive")
    }

    pub fn is_live_snapshot(&self) -> bool {
        self.is_snapshot && !self.is_inactive()
    }
}

#[derive(Default)]
pub struct RecordingConsumer {
    events: Mutex<Vec<Event>>,
}

impl RecordingConsumer {
    /// Position to pass to `since`.
    pub fn mark(&self) -> usize {
        self.events.lock().len()
    }

    pub fn since(&self, mark: usize) -> Vec<Event> {
        self.events.lock()[mark..].to_vec()
    }

    pub fn for_item(&self, mark: usize, handle: &str) -> Vec<Event> {
        self.since(mark)
            .into_iter()
            .filter(|e| e.handle == handle)
            .collect()
    }

    pub fn count(&self, mark: usize, handle: &str, predicate: impl Fn(&Event) -> bool) -> usize {
        self.for_item(mark, handle)
            .iter()
            .filter(|e| predicate(*e))
            .count()
    }
}

impl ItemEventListener for RecordingConsumer {
    type Handle = String;

    fn on_update(&self, handle: &String, fields: &FieldMap, is_snapshot: bool) {
        self.events.lock().push(Event {
            handle: handle.clone(),
            fields: fields.clone(),
            is_snapshot,
        });
    }
}

pub struct Deployment {
    pub broker: Arc<InMemoryBroker>,
    pub adapter: Arc<FeedAdapter<RecordingConsumer>>,
    pub consumer: Arc<RecordingConsumer>,
}

impl Deployment {
    /// A broker with an adapter attached and `items` subscribed before the
    /// adapter starts, so each of them begins with an inactive snapshot.
    pub fn new(items: &[&str]) -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare(DEFAULT_QUEUE_NAME);
        broker.declare(DEFAULT_TOPIC_NAME);

        let consumer = Arc::new(RecordingConsumer::default());
        let adapter = FeedAdapter::new(
            AdapterConfig {
                recovery_pause: Duration::from_millis(20),
                watchdog_interval: WATCHDOG,
                pool_batch: 2,
            },
            transport(&broker, Role::Adapter),
            Arc::clone(&consumer),
            Handle::current(),
        )
        .unwrap();

        for item in items {
            adapter.subscribe(item, (*item).to_string()).unwrap();
        }
        adapter.start();

        Self {
            broker,
            adapter,
            consumer,
        }
    }

    /// Start a generator run with the given epoch on this broker.
    pub fn start_generator(&self, epoch: u32) -> Arc<Generator> {
        let config = GeneratorConfig {
            heartbeat_interval: Duration::from_millis(50),
            tick_interval: Duration::from_millis(5),
            recovery_pause: Duration::from_millis(20),
            pool_batch: 2,
            epoch: None,
            seed: Some(u64::from(epoch)),
        }
        .with_epoch(epoch);
        let simulator = Arc::new(FeedSimulator::new(config.tick_interval, config.seed));
        let generator = Generator::new(
            config,
            transport(&self.broker, Role::Generator),
            simulator,
            Handle::current(),
        )
        .unwrap();
        generator.start();
        generator
    }
}

pub fn transport(broker: &Arc<InMemoryBroker>, role: Role) -> Arc<dyn Transport> {
    Arc::new(InMemoryTransport::new(
        Arc::clone(broker),
        role,
        DEFAULT_QUEUE_NAME,
        DEFAULT_TOPIC_NAME,
        Handle::current(),
    ))
}

/// Poll `condition` for up to five seconds.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..1000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
