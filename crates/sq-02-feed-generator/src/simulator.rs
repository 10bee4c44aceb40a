//! Random-walk quote source for items `item1`..`item30`.

use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{FieldMap, ItemName};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::{StockQuote, STOCK_NAMES};
use crate::ports::FeedListener;

pub struct FeedSimulator {
    quotes: Mutex<Vec<(ItemName, StockQuote)>>,
    rng: Mutex<StdRng>,
    listener: RwLock<Option<Weak<dyn FeedListener>>>,
    tick_interval: Duration,
}

impl FeedSimulator {
    /// A simulator with reference prices drawn from `seed`, or from entropy.
    #[must_use]
    pub fn new(tick_interval: Duration, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let quotes = ItemName::all()
            .zip(STOCK_NAMES)
            .map(|(item, name)| {
                let ref_price = f64::from(rng.gen_range(500_u32..=5_000)) / 100.0;
                (item, StockQuote::new(name, ref_price))
            })
            .collect();

        Self {
            quotes: Mutex::new(quotes),
            rng: Mutex::new(rng),
            listener: RwLock::new(None),
            tick_interval,
        }
    }

    pub fn set_listener(&self, listener: Weak<dyn FeedListener>) {
        *self.listener.write() = Some(listener);
    }

    /// Trade periodically until the returned task is aborted.
    pub fn start(self: &Arc<Self>, runtime: &Handle) -> JoinHandle<()> {
        let simulator = Arc::clone(self);
        debug!(interval_ms = self.tick_interval.as_millis() as u64, "Quote simulator started");

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(simulator.tick_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                simulator.tick();
            }
        })
    }

    /// Trade one random item and report it as a delta.
    pub fn tick(&self) -> ItemName {
        let (item, fields) = {
            let mut rng = self.rng.lock();
            let mut quotes = self.quotes.lock();
            let index = rng.gen_range(0..quotes.len());
            let (item, quote) = &mut quotes[index];
            quote.advance(&mut *rng, unix_secs());
            (item.clone(), quote.fields())
        };

        trace!(item = %item, "Simulated trade");
        self.emit(&item, &fields, false);
        item
    }

    /// Report the current state of `item` as a snapshot.
    pub fn send_current_values(&self, item: &ItemName) {
        let Some(fields) = self.current_values(item) else {
            return;
        };
        self.emit(item, &fields, true);
    }

    #[must_use]
    pub fn current_values(&self, item: &ItemName) -> Option<FieldMap> {
        self.quotes
            .lock()
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, quote)| quote.fields())
    }

    fn emit(&self, item: &ItemName, fields: &FieldMap, is_snapshot: bool) {
        let listener = self.listener.read().as_ref().and_then(Weak::upgrade);
        if let Some(listener) = listener {
            listener.on_event(item, fields, is_snapshot);
        }
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
