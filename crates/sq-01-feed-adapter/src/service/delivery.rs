//! Inbound path: liveness accounting, then routing to the consumer.

use shared_types::{BusMessage, FeedMessage, ProducerEpoch};
use tracing::{debug, info, warn};

use feed_telemetry::metrics::{
    HEARTBEATS_RECEIVED, PRODUCER_EPOCH_CHANGES, UPDATES_DELIVERED, UPDATES_DISCARDED,
};

use super::FeedAdapter;
use crate::domain::EpochObservation;
use crate::ports::ItemEventListener;

impl<L: ItemEventListener> FeedAdapter<L> {
    pub(crate) fn handle_payload(&self, payload: &[u8]) {
        let message = match BusMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                UPDATES_DISCARDED.with_label_values(&["malformed"]).inc();
                warn!(error = %e, "Discarding bus message");
                return;
            }
        };

        match message {
            BusMessage::Heartbeat { epoch } => {
                HEARTBEATS_RECEIVED.inc();
                self.observe_epoch(epoch);
            }
            BusMessage::Update(update) => {
                if self.observe_epoch(update.epoch) {
                    self.deliver(&update);
                } else {
                    // Produced before the generator saw our re-subscription.
                    UPDATES_DISCARDED.with_label_values(&["new_epoch"]).inc();
                    debug!(item = %update.item, epoch = %update.epoch, "Update from new producer run dropped");
                }
            }
        }
    }

    /// Feed one epoch into the liveness state.
    ///
    /// Returns `true` if the message belongs to the producer run already
    /// known. A new run triggers the full re-subscription, a watchdog bound
    /// to that run and a dispatch round.
    fn observe_epoch(&self, epoch: ProducerEpoch) -> bool {
        let observation = {
            let mut state = self.state.write();
            let observation = state.liveness.observe(epoch);
            if let EpochObservation::New { previous } = observation {
                PRODUCER_EPOCH_CHANGES.inc();
                info!(
                    epoch = %epoch,
                    previous = ?previous,
                    subscriptions = state.registry.len(),
                    "New producer run, feed available"
                );
                state.resubscribe_all();
            }
            observation
        };

        match observation {
            EpochObservation::Current => true,
            EpochObservation::New { .. } => {
                self.spawn_watchdog(epoch);
                self.spawn_dispatch();
                false
            }
        }
    }

    fn deliver(&self, update: &FeedMessage) {
        let state = self.state.read();

        let Some(subscription) = state.registry.get(&update.item) else {
            UPDATES_DISCARDED.with_label_values(&["unsubscribed"]).inc();
            debug!(item = %update.item, "Update for not subscribed item");
            return;
        };

        if subscription.id() != update.subscription_id {
            UPDATES_DISCARDED.with_label_values(&["superseded"]).inc();
            debug!(
                item = %update.item,
                carried = %update.subscription_id,
                current = %subscription.id(),
                "Update for superseded subscription"
            );
            return;
        }

        // The generator always sends complete field maps, so whichever
        // update gets here first is a valid snapshot regardless of the flag
        // it carries.
        let is_snapshot = subscription.claim_snapshot();
        UPDATES_DELIVERED
            .with_label_values(&[if is_snapshot { "snapshot" } else { "delta" }])
            .inc();
        self.listener
            .on_update(subscription.handle(), &update.fields, is_snapshot);
    }
}
