//! Consumer that writes every update to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use shared_types::FieldMap;
use sq_01_feed_adapter::ItemEventListener;
use tracing::info;

/// Logs updates; the handle is the item name it subscribed with.
#[derive(Debug, Default)]
pub struct LoggingConsumer {
    snapshots: AtomicU64,
    deltas: AtomicU64,
}

impl LoggingConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn deltas(&self) -> u64 {
        self.deltas.load(Ordering::Relaxed)
    }
}

impl ItemEventListener for LoggingConsumer {
    type Handle = String;

    fn on_update(&self, handle: &String, fields: &FieldMap, is_snapshot: bool) {
        let counter = if is_snapshot {
            &self.snapshots
        } else {
            &self.deltas
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let field = |name: &str| fields.get(name).map_or("-", String::as_str);
        info!(
            item = %handle,
            snapshot = is_snapshot,
            status = field("item_status"),
            stock = field("stock_name"),
            last = field("last_price"),
            time = field("time"),
            "Quote update"
        );
    }
}
