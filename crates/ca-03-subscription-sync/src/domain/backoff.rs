//! # Bounded Exponential Backoff
//!
//! `delay(n) = min(initial_delay * factor^n, max_delay)`; at most
//! `1 + max_retries` attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use committee_telemetry::SOURCE_RETRIES;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::errors::SyncError;

/// Retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied per retry.
    pub factor: u32,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            factor: 2,
            max_retries: 5,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        let multiplier = self.factor.max(1).saturating_pow(retry);
        self.initial_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Total attempts including the first.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &BackoffPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if retry < policy.max_retries => {
                let delay = policy.delay(retry);
                warn!(
                    operation = name,
                    attempt = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    error
                );
                SOURCE_RETRIES.inc();
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(error) => {
                return Err(SyncError::RetriesExhausted {
                    operation: name.to_string(),
                    attempts: policy.attempts(),
                    last_error: error.to_string(),
                });
            }
        }
    }
}
