//! # Store Errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Snapshot persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another process holds the snapshot directory.
    #[error("Snapshot directory already in use ({})", path.display())]
    Locked { path: PathBuf },

    /// Injected by the in-memory store.
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}
