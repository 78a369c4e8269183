//! Prometheus metrics for the projection engine.
//!
//! All metrics follow the naming convention: `ca_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // NORMALIZER (Component 2)
    // =========================================================================

    /// Logs dropped before reaching the pipeline
    pub static ref LOGS_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("ca_normalizer_logs_dropped_total", "Raw logs dropped by the normalizer"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // SYNCHRONIZER (Component 3)
    // =========================================================================

    /// Synchronizers currently running
    pub static ref ACTIVE_SUBSCRIPTIONS: IntGauge = IntGauge::new(
        "ca_sync_active_subscriptions",
        "Number of watched contract addresses"
    ).expect("metric creation failed");

    /// Logs fetched from the chain, by phase
    pub static ref LOGS_FETCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("ca_sync_logs_fetched_total", "Logs fetched from the chain source"),
        &["phase"]  // phase: cached/recent/live
    ).expect("metric creation failed");

    /// Retries of chain source calls
    pub static ref SOURCE_RETRIES: IntCounter = IntCounter::new(
        "ca_sync_source_retries_total",
        "Chain source calls retried after a failure"
    ).expect("metric creation failed");

    /// Synchronizers restarted after a failed run
    pub static ref SYNC_RESTARTS: IntCounter = IntCounter::new(
        "ca_sync_restarts_total",
        "Synchronizer runs restarted after giving up"
    ).expect("metric creation failed");

    // =========================================================================
    // STORE (Components 4, 5)
    // =========================================================================

    /// Events folded into state, by name
    pub static ref EVENTS_FOLDED: IntCounterVec = IntCounterVec::new(
        Opts::new("ca_store_events_folded_total", "Events applied by the projector"),
        &["event"]
    ).expect("metric creation failed");

    /// Events whose enrichment reads failed
    pub static ref FOLD_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("ca_store_fold_failures_total", "Events left unapplied after a failed read"),
        &["event"]
    ).expect("metric creation failed");

    /// Cached (reorg-safe) height per watched address
    pub static ref CACHED_HEIGHT: IntGaugeVec = IntGaugeVec::new(
        Opts::new("ca_store_cached_height", "Last cached block per watched address"),
        &["address"]
    ).expect("metric creation failed");

    /// Committees in the materialized view
    pub static ref COMMITTEES: IntGauge = IntGauge::new(
        "ca_store_committees",
        "Number of committees in the materialized state"
    ).expect("metric creation failed");

    /// Snapshot writes that failed
    pub static ref SNAPSHOT_FAILURES: IntCounter = IntCounter::new(
        "ca_store_snapshot_failures_total",
        "Snapshot persistence failures"
    ).expect("metric creation failed");

    /// Dead letters retained
    pub static ref DEAD_LETTERS: IntGauge = IntGauge::new(
        "ca_store_dead_letters",
        "Dead letters currently retained"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Normalizer
        Box::new(LOGS_DROPPED.clone()),
        // Synchronizer
        Box::new(ACTIVE_SUBSCRIPTIONS.clone()),
        Box::new(LOGS_FETCHED.clone()),
        Box::new(SOURCE_RETRIES.clone()),
        Box::new(SYNC_RESTARTS.clone()),
        // Store
        Box::new(EVENTS_FOLDED.clone()),
        Box::new(FOLD_FAILURES.clone()),
        Box::new(CACHED_HEIGHT.clone()),
        Box::new(COMMITTEES.clone()),
        Box::new(SNAPSHOT_FAILURES.clone()),
        Box::new(DEAD_LETTERS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
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
