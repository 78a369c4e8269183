//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to use ANSI colors in plain output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "committee-admin".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CA_SERVICE_NAME`: Service name (default: committee-admin)
    /// - `CA_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CA_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `NO_COLOR`: Disable ANSI colors when set
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CA_SERVICE_NAME")
                .unwrap_or_else(|_| "committee-admin".to_string()),

            log_level: env::var("CA_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CA_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            ansi: env::var("NO_COLOR").is_err(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
