//! Outbound dispatch of queued control requests.
//!
//! Every registry change that enqueues a request spawns one blocking round.
//! Rounds may overlap; the atomic pop guarantees each request is sent by
//! exactly one of them, in queue order per round.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use feed_telemetry::metrics::{REQUESTS_DISPATCHED, REQUESTS_FAILED};

use super::FeedAdapter;
use crate::ports::ItemEventListener;

impl<L: ItemEventListener> FeedAdapter<L> {
    /// Spawn a dispatch round. Returns `None` if the adapter is going away.
    pub(crate) fn spawn_dispatch(&self) -> Option<JoinHandle<usize>> {
        let adapter = self.me.upgrade()?;
        Some(
            self.runtime
                .spawn_blocking(move || adapter.dispatch_pending()),
        )
    }

    /// Send queued requests until the queue is empty; returns how many
    /// were sent successfully.
    ///
    /// A failed send drops the request: a reconnect always ends in a full
    /// re-subscription, which supersedes anything lost here.
    pub(crate) fn dispatch_pending(&self) -> usize {
        let state = self.state.read();
        let mut sent = 0;

        while let Some(request) = state.pending.pop() {
            match self.bus.send_request(&request) {
                Ok(()) => {
                    REQUESTS_DISPATCHED.inc();
                    sent += 1;
                }
                Err(e) => {
                    REQUESTS_FAILED.inc();
                    warn!(request = %request, error = %e, "Control request dropped");
                }
            }
        }

        debug!(sent, "Dispatch round finished");
        sent
    }
}
