//! Adapter configuration

use std::time::Duration;

use shared_bus::{DEFAULT_POOL_BATCH, DEFAULT_RECOVERY_PAUSE};

/// Default period of the producer watchdog.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(2);

/// Tuning knobs of the feed adapter.
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    /// Pause between two bus connection attempts
    pub recovery_pause: Duration,
    /// A producer silent for a whole interval is declared down
    pub watchdog_interval: Duration,
    /// Envelopes added to a message pool when it runs dry
    pub pool_batch: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            recovery_pause: DEFAULT_RECOVERY_PAUSE,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
            pool_batch: DEFAULT_POOL_BATCH,
        }
    }
}

impl AdapterConfig {
    /// Configuration for tests: short intervals, tiny pools.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            recovery_pause: Duration::from_millis(20),
            watchdog_interval: Duration::from_millis(300),
            pool_batch: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.recovery_pause, Duration::from_millis(2000));
        assert_eq!(config.watchdog_interval, Duration::from_secs(2));
        assert_eq!(config.pool_batch, 15);
    }
}
