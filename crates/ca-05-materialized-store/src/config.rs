//! # Store Configuration

use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_DEAD_LETTER_CAPACITY;

/// Materialized store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Dead letters kept before the oldest is evicted.
    pub dead_letter_capacity: usize,
    /// Persist after every change even while contracts are catching up.
    ///
    /// When unset, changes made during a catch-up are persisted with the
    /// next sync marker.
    pub persist_during_catch_up: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dead_letter_capacity: DEFAULT_DEAD_LETTER_CAPACITY,
            persist_during_catch_up: false,
        }
    }
}
