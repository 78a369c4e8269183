//! # Synchronizer Configuration

use serde::{Deserialize, Serialize};
use shared_types::BlockNumber;

use crate::domain::BackoffPolicy;

/// Blocks below the head that are considered settled.
pub const DEFAULT_REORG_SAFETY_MARGIN: u64 = 100;

/// Blocks requested per `past_logs` call.
pub const DEFAULT_LOG_BATCH_SIZE: u64 = 10_000;

/// Configuration shared by every synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Distance from the head below which history is cached.
    pub reorg_safety_margin: u64,
    /// First block fetched for an address without a cached record.
    pub genesis_block: BlockNumber,
    /// Maximum blocks per historical request.
    pub log_batch_size: u64,
    /// Retry schedule for chain source calls.
    pub backoff: BackoffPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reorg_safety_margin: DEFAULT_REORG_SAFETY_MARGIN,
            genesis_block: 0,
            log_batch_size: DEFAULT_LOG_BATCH_SIZE,
            backoff: BackoffPolicy::default(),
        }
    }
}
