//! # CA-03 Subscription Synchronizer
//!
//! For one contract address, produces a gap-free ordered sequence of its
//! historical and live events, resumable from a cached height.
//!
//! **Component:** 3
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Phases
//!
//! | Phase | Blocks | Closing marker |
//! |-------|--------|----------------|
//! | A (cached) | `[resume_from, head - margin]` | `SYNC_SUBSCRIPTION_CACHED` |
//! | B (recent) | `(cache_height, head]` | `SYNC_SUBSCRIPTION_SYNCED` |
//! | C (live) | `head + 1` onwards | - |
//!
//! Chain source calls are retried with bounded exponential backoff. Every
//! task observes a `CancellationToken`.
//!
//! ## Module Structure
//!
//! ```text
//! ca-03-subscription-sync/
//! ├── domain/          # plan_sync, BackoffPolicy, SyncError
//! ├── ports/           # ChainLogSource (+ MockChainLogSource)
//! ├── application/     # SubscriptionSynchronizer, SubscriptionManager
//! └── config.rs        # SyncConfig
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{CatchUp, SubscriptionManager, SubscriptionSynchronizer};
pub use config::{SyncConfig, DEFAULT_LOG_BATCH_SIZE, DEFAULT_REORG_SAFETY_MARGIN};
pub use domain::{plan_sync, retry_with_backoff, BackoffPolicy, BlockRange, SyncError, SyncPlan};
pub use ports::{ChainLogSource, LogStream, MockChainLogSource};
