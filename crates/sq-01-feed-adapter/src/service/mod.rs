//! Feed Adapter Service - Core orchestration
//!
//! ## Lock discipline
//!
//! One `parking_lot::RwLock` guards the subscription registry, the
//! pending-request queue and the liveness state together.
//!
//! | Path | Lock |
//! |------|------|
//! | subscribe / unsubscribe | write |
//! | epoch observation (every inbound message) | write |
//! | watchdog check, bus loss, bus (re)connected | write |
//! | inbound update delivery | read |
//! | dispatch round | read (queue pops are atomic) |
//!
//! No lock is held across an `.await`.

mod delivery;
mod dispatcher;
mod watchdog;


use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use shared_bus::{
    BusHandler, GenerationCounter, GenerationToken, InboundListener, PoolError,
    ReconnectSupervisor, Transport, TransportError,
};
use shared_types::{ControlRequest, ItemName, ProducerEpoch, SubscriptionId};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use feed_telemetry::metrics::{FEED_DOWN_EVENTS, UPDATES_DELIVERED};

use crate::config::AdapterConfig;
use crate::domain::{inactive_delta, inactive_snapshot, AdapterState, FeedStatus, Subscription};
use crate::error::{SubscriptionError, SubscriptionResult};
use crate::ports::{DataProvider, ItemEventListener};

/// Consumer-side end of the feed.
///
/// Always handled through an `Arc`: spawned units (reconnect supervisor,
/// watchdog, dispatch rounds) hold weak references back to the adapter.
pub struct FeedAdapter<L: ItemEventListener> {
    config: AdapterConfig,
    state: RwLock<AdapterState<L::Handle>>,
    bus: BusHandler,
    listener: Arc<L>,
    generations: GenerationCounter,
    runtime: Handle,
    me: Weak<Self>,
}

impl<L: ItemEventListener> FeedAdapter<L> {
    /// Create an adapter. Nothing happens on the bus until `start`.
    ///
    /// Spawned units run on `runtime`, so the adapter can be driven from
    /// any thread.
    pub fn new(
        config: AdapterConfig,
        transport: Arc<dyn Transport>,
        listener: Arc<L>,
        runtime: Handle,
    ) -> Result<Arc<Self>, PoolError> {
        let bus = BusHandler::new(transport, config.pool_batch)?;

        Ok(Arc::new_cyclic(|me| Self {
            config,
            state: RwLock::new(AdapterState::new()),
            bus,
            listener,
            generations: GenerationCounter::new(),
            runtime,
            me: me.clone(),
        }))
    }

    /// Register for inbound traffic and start connecting to the bus.
    pub fn start(&self) {
        let listener: Weak<dyn InboundListener> = self.me.clone();
        self.bus.set_listener(listener);
        info!("Feed adapter starting");
        self.start_reconnect();
    }

    /// Stop every spawned unit and close the bus session.
    pub fn shutdown(&self) {
        self.generations.invalidate();
        {
            let mut state = self.state.write();
            state.liveness.clear_epoch();
            state.liveness.set_bus_connected(false);
        }
        self.bus.reset();
        info!("Feed adapter stopped");
    }

    #[must_use]
    pub fn status(&self) -> FeedStatus {
        self.state.read().liveness.status()
    }

    #[must_use]
    pub fn producer_epoch(&self) -> Option<ProducerEpoch> {
        self.state.read().liveness.epoch()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Requests queued but not yet sent, front first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<ControlRequest> {
        self.state.read().pending.snapshot()
    }

    /// The bus handler, for pool statistics.
    #[must_use]
    pub fn bus(&self) -> &BusHandler {
        &self.bus
    }

    fn start_reconnect(&self) {
        let supervisor =
            ReconnectSupervisor::new(&self.generations, self.config.recovery_pause, "adapter");
        let token = supervisor.token();
        let reset_token = supervisor.token();
        let (for_reset, for_connect, for_connected) =
            (self.me.clone(), self.me.clone(), self.me.clone());

        supervisor.spawn(
            &self.runtime,
            move || {
                if let Some(adapter) = for_reset.upgrade() {
                    adapter.reset_bus(&reset_token);
                }
            },
            move || {
                let adapter = for_connect.upgrade();
                async move {
                    match adapter {
                        Some(adapter) => adapter.bus.connect().await,
                        None => Err(TransportError::NotReady),
                    }
                }
            },
            move || {
                if let Some(adapter) = for_connected.upgrade() {
                    adapter.on_connected(&token);
                }
            },
        );
    }

    /// Close the bus session for the supervisor holding `token`.
    ///
    /// A superseded supervisor must not tear down the session its successor
    /// may already have opened. Returns whether the session was reset.
    fn reset_bus(&self, token: &GenerationToken) -> bool {
        if !token.is_current() {
            debug!(generation = token.generation(), "Reset from a superseded supervisor skipped");
            return false;
        }
        self.bus.reset();
        true
    }

    fn on_connected(&self, token: &GenerationToken) {
        let mut state = self.state.write();
        if !token.is_current() {
            debug!("Connection from a superseded supervisor ignored");
            return;
        }
        state.liveness.set_bus_connected(true);
        info!(
            subscriptions = state.registry.len(),
            "Bus connected, waiting for producer heartbeat"
        );
    }

    /// Tell the consumer the item has no live data.
    ///
    /// A subscription that never produced a snapshot gets the full inactive
    /// snapshot; otherwise only the status field flips.
    fn deliver_inactive(&self, subscription: &Subscription<L::Handle>) {
        let is_snapshot = subscription.claim_snapshot();
        let fields = if is_snapshot {
            inactive_snapshot()
        } else {
            inactive_delta()
        };
        UPDATES_DELIVERED.with_label_values(&["inactive"]).inc();
        self.listener
            .on_update(subscription.handle(), &fields, is_snapshot);
    }

    /// The producer or the bus is gone. Caller holds the write lock.
    fn degrade(&self, state: &mut AdapterState<L::Handle>, cause: &'static str) {
        state.liveness.clear_epoch();
        FEED_DOWN_EVENTS.with_label_values(&[cause]).inc();
        info!(
            cause,
            subscriptions = state.registry.len(),
            "Feed no longer available"
        );

        for (_, subscription) in state.registry.iter() {
            self.deliver_inactive(subscription);
        }
    }
}

impl<L: ItemEventListener> DataProvider<L::Handle> for FeedAdapter<L> {
    fn subscribe(&self, item: &str, handle: L::Handle) -> SubscriptionResult<SubscriptionId> {
        let item = ItemName::parse(item)?;

        let (id, dispatch) = {
            let mut state = self.state.write();
            let (id, replaced) = state.registry.insert(item.clone(), handle);
            if let Some(previous) = replaced {
                debug!(item = %item, previous = %previous.id(), "Subscription replaced");
            }

            if state.liveness.is_feed_up() {
                state.pending.push(ControlRequest::Subscribe {
                    item: item.clone(),
                    id,
                });
                (id, true)
            } else {
                if let Some(subscription) = state.registry.get(&item) {
                    self.deliver_inactive(subscription);
                }
                (id, false)
            }
        };

        info!(item = %item, id = %id, "Subscribed");
        if dispatch {
            self.spawn_dispatch();
        }
        Ok(id)
    }

    fn unsubscribe(&self, item: &str) -> SubscriptionResult<()> {
        let not_subscribed = || SubscriptionError::NotSubscribed {
            item: item.to_string(),
        };
        let name = ItemName::parse(item).map_err(|_| not_subscribed())?;

        let (id, dispatch) = {
            let mut state = self.state.write();
            let removed = state.registry.remove(&name).ok_or_else(not_subscribed)?;

            let dispatch = state.liveness.is_feed_up();
            if dispatch {
                state.pending.push(ControlRequest::Unsubscribe {
                    item: name.clone(),
                    id: removed.id(),
                });
            }
            (removed.id(), dispatch)
        };

        info!(item = %name, id = %id, "Unsubscribed");
        if dispatch {
            self.spawn_dispatch();
        }
        Ok(())
    }

    fn is_snapshot_available(&self, _item: &str) -> bool {
        true
    }
}

impl<L: ItemEventListener> InboundListener for FeedAdapter<L> {
    fn on_message(&self, payload: &[u8]) {
        self.handle_payload(payload);
    }

    fn on_transport_error(&self, error: TransportError) {
        warn!(error = %error, "Bus connection lost");
        {
            let mut state = self.state.write();
            self.degrade(&mut state, "bus");
            state.liveness.set_bus_connected(false);
        }
        self.start_reconnect();
    }
}

impl<L: ItemEventListener> Drop for FeedAdapter<L> {
    fn drop(&mut self) {
        // Outstanding supervisors must not retry forever against a dead adapter.
        self.generations.invalidate();
    }
}
