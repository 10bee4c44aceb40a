//! Producer liveness state.
//!
//! "Bus connected" and "producer alive" are tracked separately: a healthy
//! bus with a crashed generator looks exactly like a quiet feed unless the
//! producer's epoch and heartbeat count are watched.
//!
//! ```text
//!  [DOWN] ──connect ok──→ [IDLE] ──first epoch──→ [UP] ──different epoch──→ [UP] (re-entry)
//!    ↑                      │                      │
//!    └──── transport error ─┴──────────────────────┘
//!                           ↑                      │
//!                           └── watchdog timeout ──┘
//! ```

use shared_types::ProducerEpoch;

/// Externally visible feed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No bus session.
    Down,
    /// Bus session open, no producer heard from.
    Idle,
    /// Producer epoch known and heartbeats flowing.
    Up,
}

/// Result of feeding one inbound epoch into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochObservation {
    /// Same producer run as before; the stall counter moved.
    Current,
    /// A producer run not seen before (or the first one after the feed was
    /// declared down).
    New { previous: Option<ProducerEpoch> },
}

/// Process-wide liveness of the bus and of the producer behind it.
#[derive(Debug, Default)]
pub struct LivenessState {
    bus_connected: bool,
    epoch: Option<ProducerEpoch>,
    stall_counter: u64,
}

impl LivenessState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> FeedStatus {
        match (self.bus_connected, self.epoch) {
            (false, _) => FeedStatus::Down,
            (true, None) => FeedStatus::Idle,
            (true, Some(_)) => FeedStatus::Up,
        }
    }

    /// Whether a producer run is currently accepted.
    #[must_use]
    pub fn is_feed_up(&self) -> bool {
        self.epoch.is_some()
    }

    #[must_use]
    pub fn epoch(&self) -> Option<ProducerEpoch> {
        self.epoch
    }

    #[must_use]
    pub fn stall_counter(&self) -> u64 {
        self.stall_counter
    }

    #[must_use]
    pub fn bus_connected(&self) -> bool {
        self.bus_connected
    }

    pub fn set_bus_connected(&mut self, connected: bool) {
        self.bus_connected = connected;
    }

    /// Account for a heartbeat or update carrying `epoch`.
    ///
    /// A message can only arrive through an open session, so observing one
    /// also marks the bus connected.
    pub fn observe(&mut self, epoch: ProducerEpoch) -> EpochObservation {
        self.bus_connected = true;

        if self.epoch == Some(epoch) {
            self.stall_counter = self.stall_counter.wrapping_add(1);
            return EpochObservation::Current;
        }

        let previous = self.epoch.replace(epoch);
        self.stall_counter = 0;
        EpochObservation::New { previous }
    }

    /// Forget the producer run; the next epoch seen will be new.
    pub fn clear_epoch(&mut self) {
        self.epoch = None;
    }
}
