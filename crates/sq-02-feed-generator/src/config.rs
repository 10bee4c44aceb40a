//! Generator configuration

use std::time::Duration;

use shared_bus::{DEFAULT_POOL_BATCH, DEFAULT_RECOVERY_PAUSE};
use shared_types::ProducerEpoch;

/// Default heartbeat period. Must stay below the consumer's watchdog interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Default pause between two simulated trades.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub heartbeat_interval: Duration,
    pub tick_interval: Duration,
    pub recovery_pause: Duration,
    pub pool_batch: usize,
    /// Fixed epoch for this run; drawn at random when `None`.
    pub epoch: Option<ProducerEpoch>,
    /// Seed of the quote simulator; drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            recovery_pause: DEFAULT_RECOVERY_PAUSE,
            pool_batch: DEFAULT_POOL_BATCH,
            epoch: None,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Configuration for tests: short intervals, fixed seed.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(50),
            tick_interval: Duration::from_millis(10),
            recovery_pause: Duration::from_millis(20),
            pool_batch: 2,
            epoch: None,
            seed: Some(42),
        }
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.epoch = Some(ProducerEpoch(epoch));
        self
    }
}
