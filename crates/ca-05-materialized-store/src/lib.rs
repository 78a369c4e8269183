//! # CA-05 Materialized Store
//!
//! Owns the committees state and is the only consumer of the event
//! pipeline.
//!
//! **Component:** 5
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Responsibilities
//!
//! - Fold each event through the state projector, one at a time
//! - Republish the state to subscribers after every change
//! - Persist snapshots and restore them on startup
//! - Run projector effects (start and stop synchronizers)
//! - Keep a bounded log of events whose enrichment failed
//!
//! ## Restore
//!
//! | Snapshot part | On restore |
//! |---------------|------------|
//! | Committees | Kept, members cleared, one `RescanMembers` each |
//! | Permissions | Kept |
//! | Cached subscriptions | Height kept, phase reset to `UNSYNCED` |
//!
//! ## Module Structure
//!
//! ```text
//! ca-05-materialized-store/
//! ├── config.rs        # StoreConfig
//! ├── domain/          # restore, DeadLetterLog, StoreError
//! ├── ports/           # SnapshotPersistence, EffectHandler (+ mock)
//! ├── adapters/        # FileSnapshotStore, MemorySnapshotStore, SubscriptionManager effects
//! └── application/     # MaterializedStore, StoreHandle
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{FileSnapshotStore, MemorySnapshotStore};
pub use application::{load_snapshot, MaterializedStore, StoreHandle};
pub use config::StoreConfig;
pub use domain::{restore, DeadLetterLog, Restored, StoreError};
pub use ports::{EffectHandler, RecordingEffectHandler, SnapshotPersistence};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
