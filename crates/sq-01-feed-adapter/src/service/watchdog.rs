//! Producer watchdog.
//!
//! One task per producer epoch. It compares the stall counter with the value
//! it saw one interval earlier; an unchanged counter means no heartbeat or
//! update arrived in a whole interval.

use shared_types::ProducerEpoch;
use tracing::{debug, warn};

use super::FeedAdapter;
use crate::ports::ItemEventListener;

impl<L: ItemEventListener> FeedAdapter<L> {
    pub(crate) fn spawn_watchdog(&self, epoch: ProducerEpoch) {
        let weak = self.me.clone();
        let interval = self.config.watchdog_interval;

        self.runtime.spawn(async move {
            let mut last_seen = 0;
            loop {
                tokio::time::sleep(interval).await;
                let Some(adapter) = weak.upgrade() else {
                    return;
                };
                if !adapter.watchdog_check(epoch, &mut last_seen) {
                    return;
                }
            }
        });
    }

    /// One watchdog tick. Returns whether the watchdog should keep running.
    fn watchdog_check(&self, epoch: ProducerEpoch, last_seen: &mut u64) -> bool {
        let mut state = self.state.write();

        if state.liveness.epoch() != Some(epoch) || !state.liveness.bus_connected() {
            debug!(epoch = %epoch, "Watchdog retired");
            return false;
        }

        let counter = state.liveness.stall_counter();
        if counter == *last_seen {
            warn!(
                epoch = %epoch,
                interval_ms = self.config.watchdog_interval.as_millis() as u64,
                "No heartbeat within interval, producer considered down"
            );
            self.degrade(&mut state, "producer");
            return false;
        }

        *last_seen = counter;
        true
    }
}
