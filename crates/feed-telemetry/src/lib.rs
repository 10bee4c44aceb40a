//! # Feed Telemetry
//!
//! Observability for both ends of the stock quotes feed.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and
//!   either a pretty or a JSON formatting layer
//! - **Metrics**: Prometheus counters and gauges in a process-wide registry,
//!   rendered in the text exposition format by `encode_metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feed_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `stockquotes-feed` | Service name attached to log output |
//! | `SQ_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SQ_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `SQ_CONSOLE_OUTPUT` | `true` | Emit logs to stdout at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register every metric.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, so counters bumped during logging setup are not lost.
    let metrics = register_metrics()?;
    init_logging(config)?;

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
