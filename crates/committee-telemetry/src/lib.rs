//! # Committee Telemetry
//!
//! Logging and metrics for the committee projection engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use committee_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CA_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `CA_JSON_LOGS` | `false` | JSON log lines |
//! | `CA_SERVICE_NAME` | `committee-admin` | Service name in logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, ACTIVE_SUBSCRIPTIONS, CACHED_HEIGHT, COMMITTEES,
    DEAD_LETTERS, EVENTS_FOLDED, FOLD_FAILURES, LOGS_DROPPED, LOGS_FETCHED, SNAPSHOT_FAILURES,
    SOURCE_RETRIES, SYNC_RESTARTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
