//! # CA-04 State Projector
//!
//! The pure fold at the heart of the engine.
//!
//! **Component:** 4
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! `reduce(state, event)` turns the current `AppState` and one normalized
//! event into the next state plus the follow-up effects the store must run.
//! The only I/O it performs is reading contracts through the contract reader.
//!
//! | Event | Transition |
//! |-------|------------|
//! | `CreateCommittee` | Enrich from chain, append, watch the token |
//! | `ModifyCommitteeInfo` | Update name and description |
//! | `RemoveCommittee` | Drop the committee, unwatch the token |
//! | `Transfer`, `RescanMembers` | Re-read candidate balances, rebuild members |
//! | `SetPermission` | Upsert the grant or write a tombstone |
//! | `SYNC_STATUS_*` | Toggle `is_syncing` |
//! | `SYNC_SUBSCRIPTION_*` | Advance the per-address record |
//!
//! ## Module Structure
//!
//! ```text
//! ca-04-state-projector/
//! ├── config.rs        # ProjectorConfig
//! ├── domain/          # Effect, Reduction, ProjectionError
//! └── application/     # StateProjector
//! ```

#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

pub use application::StateProjector;
pub use config::ProjectorConfig;
pub use domain::{Effect, ProjectionError, Reduction};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
