//! # Stock Quotes Feed Runtime
//!
//! Runs a quote generator and a feed adapter in one process, connected
//! through the in-memory broker, with a consumer logging every update.
//!
//! ## Startup Sequence
//!
//! 1. Initialise telemetry (logging + metrics)
//! 2. Load configuration (file given as first argument or `SQ_CONFIG`, then env)
//! 3. Build broker, generator, adapter and consumer
//! 4. Start both sides, subscribe the configured items
//! 5. Run until Ctrl+C

use std::path::PathBuf;

use anyhow::{Context, Result};
use feed_runtime::{FeedRuntime, RuntimeConfig};
use feed_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tokio::runtime::Handle;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::for_component("feed-runtime"))
        .context("Failed to initialise telemetry")?;

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SQ_CONFIG").ok())
        .map(PathBuf::from);
    let config = RuntimeConfig::load(path.as_deref()).context("Failed to load configuration")?;

    let runtime =
        FeedRuntime::build(config, Handle::current()).context("Failed to build feed runtime")?;
    runtime.start().context("Failed to start feed runtime")?;

    info!("Feed is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown();
    if let Ok(metrics) = encode_metrics() {
        debug!(%metrics, "Final metrics");
    }

    Ok(())
}
