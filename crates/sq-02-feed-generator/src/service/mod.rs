//! Generator Service - producer side of the bus
//!
//! Listens on the request queue, keeps the subscription registry, filters
//! simulator events through the snapshot gate and publishes updates and
//! heartbeats on the topic.
//!
//! The registry sits behind a `parking_lot::Mutex` that is never held while
//! the simulator or the bus is called.


use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared_bus::{
    BusHandler, GenerationCounter, GenerationToken, InboundListener, PoolError,
    ReconnectSupervisor, Transport, TransportError,
};
use shared_types::{
    BusMessage, ControlRequest, FeedMessage, FieldMap, ItemName, ProducerEpoch, SubscriptionId,
    WireError,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use feed_telemetry::metrics::{
    GENERATOR_HEARTBEATS_PUBLISHED, GENERATOR_REQUESTS_HANDLED, GENERATOR_UPDATES_PUBLISHED,
};

use crate::config::GeneratorConfig;
use crate::domain::{GateDecision, ProducerRegistry, UnsubscribeOutcome};
use crate::ports::FeedListener;
use crate::simulator::FeedSimulator;

pub struct Generator {
    config: GeneratorConfig,
    epoch: ProducerEpoch,
    registry: Mutex<ProducerRegistry>,
    bus: BusHandler,
    simulator: Arc<FeedSimulator>,
    generations: GenerationCounter,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    runtime: Handle,
    me: Weak<Self>,
}

impl Generator {
    /// Create a generator for one producer run.
    ///
    /// The epoch is fixed here; a restarted process gets a new one.
    pub fn new(
        config: GeneratorConfig,
        transport: Arc<dyn Transport>,
        simulator: Arc<FeedSimulator>,
        runtime: Handle,
    ) -> Result<Arc<Self>, PoolError> {
        let bus = BusHandler::new(transport, config.pool_batch)?;
        let epoch = config
            .epoch
            .unwrap_or_else(|| ProducerEpoch(rand::random()));

        Ok(Arc::new_cyclic(|me| Self {
            config,
            epoch,
            registry: Mutex::new(ProducerRegistry::new()),
            bus,
            simulator,
            generations: GenerationCounter::new(),
            tasks: Mutex::new(Vec::new()),
            runtime,
            me: me.clone(),
        }))
    }

    /// Connect to the bus, start trading and heartbeating.
    pub fn start(&self) {
        let inbound: Weak<dyn InboundListener> = self.me.clone();
        self.bus.set_listener(inbound);
        let feed: Weak<dyn FeedListener> = self.me.clone();
        self.simulator.set_listener(feed);

        info!(epoch = %self.epoch, "Generator starting");
        self.start_reconnect();

        let heartbeat = self.spawn_heartbeat();
        let ticks = self.simulator.start(&self.runtime);
        self.tasks.lock().extend([heartbeat, ticks]);
    }

    pub fn shutdown(&self) {
        self.generations.invalidate();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.bus.reset();
        info!(epoch = %self.epoch, "Generator stopped");
    }

    #[must_use]
    pub fn epoch(&self) -> ProducerEpoch {
        self.epoch
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.lock().len()
    }

    #[must_use]
    pub fn is_subscribed(&self, item: &ItemName) -> bool {
        self.registry.lock().contains(item)
    }

    /// Apply one control request from the consumer.
    pub fn handle_request(&self, request: ControlRequest) {
        match request {
            ControlRequest::Reset => {
                GENERATOR_REQUESTS_HANDLED.with_label_values(&["reset"]).inc();
                let mut registry = self.registry.lock();
                info!(dropped = registry.len(), "Reset requested, clearing subscriptions");
                registry.clear();
            }
            ControlRequest::Subscribe { item, id } => {
                GENERATOR_REQUESTS_HANDLED
                    .with_label_values(&["subscribe"])
                    .inc();
                let replaced = self.registry.lock().subscribe(item.clone(), id);
                info!(item = %item, id = %id, replaced = ?replaced, "Subscribed");
                // Lock released: the snapshot comes back through on_event.
                self.simulator.send_current_values(&item);
            }
            ControlRequest::Unsubscribe { item, id } => {
                GENERATOR_REQUESTS_HANDLED
                    .with_label_values(&["unsubscribe"])
                    .inc();
                self.unsubscribe(&item, id);
            }
        }
    }

    fn unsubscribe(&self, item: &ItemName, id: SubscriptionId) {
        match self.registry.lock().unsubscribe(item, id) {
            UnsubscribeOutcome::Removed => info!(item = %item, id = %id, "Unsubscribed"),
            UnsubscribeOutcome::NotSubscribed => {
                error!(item = %item, id = %id, "Unsubscribe for item not subscribed");
            }
            UnsubscribeOutcome::Mismatch { current } => {
                warn!(
                    item = %item,
                    id = %id,
                    current = %current,
                    "Unsubscribe for stale subscription ignored"
                );
            }
        }
    }

    fn publish_heartbeat(&self) {
        match self.bus.publish(&BusMessage::Heartbeat { epoch: self.epoch }) {
            Ok(()) => GENERATOR_HEARTBEATS_PUBLISHED.inc(),
            Err(e) => debug!(error = %e, "Heartbeat not published"),
        }
    }

    fn spawn_heartbeat(&self) -> JoinHandle<()> {
        let weak = self.me.clone();
        let interval = self.config.heartbeat_interval;

        self.runtime.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(generator) = weak.upgrade() else {
                    return;
                };
                generator.publish_heartbeat();
            }
        })
    }

    /// Reset the bus unless `token` belongs to a superseded supervisor.
    fn reset_bus(&self, token: &GenerationToken) -> bool {
        if !token.is_current() {
            debug!(generation = token.generation(), "Reset from a superseded supervisor skipped");
            return false;
        }
        self.bus.reset();
        true
    }

    fn start_reconnect(&self) {
        let supervisor =
            ReconnectSupervisor::new(&self.generations, self.config.recovery_pause, "generator");
        let reset_token = supervisor.token();
        let (for_reset, for_connect) = (self.me.clone(), self.me.clone());

        supervisor.spawn(
            &self.runtime,
            move || {
                if let Some(generator) = for_reset.upgrade() {
                    generator.reset_bus(&reset_token);
                }
            },
            move || {
                let generator = for_connect.upgrade();
                async move {
                    match generator {
                        Some(generator) => generator.bus.connect().await,
                        None => Err(TransportError::NotReady),
                    }
                }
            },
            // The consumer re-subscribes once it sees our heartbeat.
            || {},
        );
    }
}

impl InboundListener for Generator {
    fn on_message(&self, payload: &[u8]) {
        let parsed = std::str::from_utf8(payload)
            .map_err(|_| WireError::NotText.to_string())
            .and_then(|text| text.parse::<ControlRequest>().map_err(|e| e.to_string()));

        match parsed {
            Ok(request) => self.handle_request(request),
            Err(reason) => {
                GENERATOR_REQUESTS_HANDLED
                    .with_label_values(&["invalid"])
                    .inc();
                error!(%reason, "Control request not understood");
            }
        }
    }

    fn on_transport_error(&self, error: TransportError) {
        warn!(error = %error, "Bus connection lost, dropping subscriptions");
        // The consumer replays its subscriptions after the next heartbeat.
        self.registry.lock().clear();
        self.start_reconnect();
    }
}

impl FeedListener for Generator {
    fn on_event(&self, item: &ItemName, fields: &FieldMap, is_snapshot: bool) {
        let decision = self.registry.lock().gate(item, is_snapshot);
        let GateDecision::Publish { id, is_snapshot } = decision else {
            return;
        };

        let message = BusMessage::Update(FeedMessage {
            item: item.clone(),
            fields: fields.clone(),
            is_snapshot,
            subscription_id: id,
            epoch: self.epoch,
        });
        match self.bus.publish(&message) {
            Ok(()) => GENERATOR_UPDATES_PUBLISHED.inc(),
            Err(e) => debug!(item = %item, error = %e, "Update not published"),
        }
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.generations.invalidate();
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
