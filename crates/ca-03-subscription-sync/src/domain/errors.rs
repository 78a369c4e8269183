//! # Domain Errors

use shared_types::Address;
use thiserror::Error;

/// Synchronizer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The chain log source failed.
    #[error("Chain source error: {0}")]
    Source(String),

    /// Every attempt of a retried operation failed.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    /// The store stopped consuming events.
    #[error("Event pipeline closed")]
    PipelineClosed,

    /// The live subscription ended without being cancelled.
    #[error("Live subscription for {address:#x} ended")]
    StreamEnded { address: Address },

    /// Cancellation was requested.
    #[error("Synchronizer cancelled")]
    Cancelled,
}

impl From<shared_bus::PipelineError> for SyncError {
    fn from(_: shared_bus::PipelineError) -> Self {
        SyncError::PipelineClosed
    }
}
