//! # Adapters
//!
//! - `file`: JSON snapshot file guarded by an exclusive lock
//! - `memory`: in-memory snapshot store for tests
//! - `subscriptions`: runs effects against the subscription manager

pub mod file;
pub mod memory;
pub mod subscriptions;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
