//! # Domain Module
//!
//! Sync planning, retry policy and errors.

pub mod backoff;
pub mod errors;
pub mod plan;

pub use backoff::{retry_with_backoff, BackoffPolicy};
pub use errors::SyncError;
pub use plan::{plan_sync, BlockRange, SyncPlan};
