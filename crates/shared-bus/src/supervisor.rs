//! # Reconnect Supervisor
//!
//! Drives a bus endpoint from "not connected" to "connected", retrying
//! forever, while letting newer supervisors silently retire older ones.
//!
//! ## Generation-based cancellation
//!
//! ```text
//!  GenerationCounter ──► 1 ── supervisor A (captures 1)
//!                    ──► 2 ── supervisor B (captures 2)   A is now stale
//!
//!  every iteration:  stale? ─yes─► Superseded
//!                      │no
//!                    reset() ─► connect().await ─ok─► stale? ─no─► on_connected()
//!                                  │err
//!                                log, stale?, sleep(recovery_pause), repeat
//! ```
//!
//! There is no explicit cancel call: creating a new supervisor is what
//! stops the previous one. Connection errors are never fatal.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use feed_telemetry::metrics::RECONNECT_ATTEMPTS;

use crate::transport::TransportError;

/// Default pause between two connection attempts.
pub const DEFAULT_RECOVERY_PAUSE: Duration = Duration::from_millis(2000);

/// Process-side counter of reconnect generations.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The newest generation handed out so far.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Retire every supervisor created so far without starting a new one.
    pub fn invalidate(&self) {
        self.advance();
    }

    fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// A captured generation, comparable against the shared counter.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    counter: GenerationCounter,
    generation: u64,
}

impl GenerationToken {
    /// Whether no newer generation has been handed out since capture.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.counter.current() == self.generation
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// How a supervisor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// `connect` succeeded and `on_connected` ran.
    Connected,
    /// A newer supervisor took over.
    Superseded,
}

/// One generation of the reconnect loop.
#[derive(Debug)]
pub struct ReconnectSupervisor {
    token: GenerationToken,
    recovery_pause: Duration,
    label: &'static str,
}

impl ReconnectSupervisor {
    /// Claim the next generation of `counter`, retiring every older
    /// supervisor sharing it.
    #[must_use]
    pub fn new(counter: &GenerationCounter, recovery_pause: Duration, label: &'static str) -> Self {
        let generation = counter.advance();
        debug!(side = label, generation, "Reconnect supervisor created");
        Self {
            token: GenerationToken {
                counter: counter.clone(),
                generation,
            },
            recovery_pause,
            label,
        }
    }

    /// Token for checks performed outside the loop (e.g. inside
    /// `on_connected` under a caller-held lock).
    #[must_use]
    pub fn token(&self) -> GenerationToken {
        self.token.clone()
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }

    /// Run the loop on the current task.
    pub async fn run<R, C, F, O>(self, mut reset: R, mut connect: C, on_connected: O) -> SupervisorOutcome
    where
        R: FnMut(),
        C: FnMut() -> F,
        F: Future<Output = Result<(), TransportError>>,
        O: FnOnce(),
    {
        let generation = self.token.generation;
        loop {
            if !self.is_current() {
                return self.superseded();
            }

            reset();

            match connect().await {
                Ok(()) => {
                    if !self.is_current() {
                        return self.superseded();
                    }
                    RECONNECT_ATTEMPTS
                        .with_label_values(&[self.label, "connected"])
                        .inc();
                    info!(side = self.label, generation, "Bus connection established");
                    on_connected();
                    return SupervisorOutcome::Connected;
                }
                Err(TransportError::Unreachable(reason)) => {
                    error!(side = self.label, %reason, "Bus not yet reachable");
                }
                Err(TransportError::InvalidEndpoint(name)) => {
                    error!(side = self.label, %name, "Endpoint name not valid (yet)");
                }
                Err(e) => {
                    error!(side = self.label, error = %e, "Bus connection failed");
                }
            }
            RECONNECT_ATTEMPTS
                .with_label_values(&[self.label, "failed"])
                .inc();

            if !self.is_current() {
                return self.superseded();
            }
            debug!(
                side = self.label,
                pause_ms = self.recovery_pause.as_millis() as u64,
                "Waiting before next connection attempt"
            );
            tokio::time::sleep(self.recovery_pause).await;
        }
    }

    /// Run the loop on its own task.
    pub fn spawn<R, C, F, O>(
        self,
        handle: &Handle,
        reset: R,
        connect: C,
        on_connected: O,
    ) -> JoinHandle<SupervisorOutcome>
    where
        R: FnMut() + Send + 'static,
        C: FnMut() -> F + Send + 'static,
        F: Future<Output = Result<(), TransportError>> + Send + 'static,
        O: FnOnce() + Send + 'static,
    {
        handle.spawn(self.run(reset, connect, on_connected))
    }

    fn superseded(&self) -> SupervisorOutcome {
        debug!(
            side = self.label,
            generation = self.token.generation,
            "Reconnect supervisor superseded"
        );
        SupervisorOutcome::Superseded
    }
}
