//! Prometheus metrics for the feed adapter and generator.
//!
//! All metrics follow the naming convention: `sq_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BUS METRICS (both sides)
    // =========================================================================

    /// Connection attempts made by reconnect supervisors
    pub static ref RECONNECT_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_bus_reconnect_attempts_total", "Bus connection attempts"),
        &["side", "outcome"]  // side: adapter/generator, outcome: connected/failed
    ).expect("metric creation failed");

    /// Outbound envelopes created by message pools
    pub static ref POOL_ENVELOPES_ALLOCATED: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_bus_pool_envelopes_allocated_total", "Envelopes created by message pools"),
        &["pool"]
    ).expect("metric creation failed");

    // =========================================================================
    // ADAPTER METRICS
    // =========================================================================

    /// Heartbeats received from the generator
    pub static ref HEARTBEATS_RECEIVED: IntCounter = IntCounter::new(
        "sq_adapter_heartbeats_received_total",
        "Heartbeats received from the generator"
    ).expect("metric creation failed");

    /// Producer runs detected
    pub static ref PRODUCER_EPOCH_CHANGES: IntCounter = IntCounter::new(
        "sq_adapter_producer_epoch_changes_total",
        "Number of new producer epochs observed"
    ).expect("metric creation failed");

    /// Updates forwarded to the consumer
    pub static ref UPDATES_DELIVERED: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_adapter_updates_delivered_total", "Updates forwarded to the consumer"),
        &["kind"]  // kind: snapshot/delta/inactive
    ).expect("metric creation failed");

    /// Inbound updates dropped before reaching the consumer
    pub static ref UPDATES_DISCARDED: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_adapter_updates_discarded_total", "Inbound updates dropped"),
        &["reason"]  // reason: unsubscribed/superseded/new_epoch/malformed
    ).expect("metric creation failed");

    /// Control requests sent to the generator
    pub static ref REQUESTS_DISPATCHED: IntCounter = IntCounter::new(
        "sq_adapter_requests_dispatched_total",
        "Control requests sent to the generator"
    ).expect("metric creation failed");

    /// Control requests dropped because the send failed
    pub static ref REQUESTS_FAILED: IntCounter = IntCounter::new(
        "sq_adapter_requests_failed_total",
        "Control requests dropped after a failed send"
    ).expect("metric creation failed");

    /// Degradations of the feed
    pub static ref FEED_DOWN_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_adapter_feed_down_events_total", "Feed degradations"),
        &["cause"]  // cause: bus/producer
    ).expect("metric creation failed");

    // =========================================================================
    // GENERATOR METRICS
    // =========================================================================

    /// Updates published on the topic
    pub static ref GENERATOR_UPDATES_PUBLISHED: IntCounter = IntCounter::new(
        "sq_generator_updates_published_total",
        "Field updates published by the generator"
    ).expect("metric creation failed");

    /// Heartbeats published on the topic
    pub static ref GENERATOR_HEARTBEATS_PUBLISHED: IntCounter = IntCounter::new(
        "sq_generator_heartbeats_published_total",
        "Heartbeats published by the generator"
    ).expect("metric creation failed");

    /// Control requests handled
    pub static ref GENERATOR_REQUESTS_HANDLED: IntCounterVec = IntCounterVec::new(
        Opts::new("sq_generator_requests_handled_total", "Control requests received"),
        &["command"]  // command: reset/subscribe/unsubscribe/invalid
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless: already registered collectors
/// are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Bus
        Box::new(RECONNECT_ATTEMPTS.clone()),
        Box::new(POOL_ENVELOPES_ALLOCATED.clone()),
        // Adapter
        Box::new(HEARTBEATS_RECEIVED.clone()),
        Box::new(PRODUCER_EPOCH_CHANGES.clone()),
        Box::new(UPDATES_DELIVERED.clone()),
        Box::new(UPDATES_DISCARDED.clone()),
        Box::new(REQUESTS_DISPATCHED.clone()),
        Box::new(REQUESTS_FAILED.clone()),
        Box::new(FEED_DOWN_EVENTS.clone()),
        // Generator
        Box::new(GENERATOR_UPDATES_PUBLISHED.clone()),
        Box::new(GENERATOR_HEARTBEATS_PUBLISHED.clone()),
        Box::new(GENERATOR_REQUESTS_HANDLED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
