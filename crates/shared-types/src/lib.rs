//! # Shared Types Crate
//!
//! This crate contains the committee data model, the raw chain log type and
//! the ABI word codec used by every component of the projection engine.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-component types are defined here.
//! - **Owned State**: `AppState` is only ever mutated by the state projector;
//!   every other component reads snapshots.
//! - **Key Identity**: Committees are keyed by `address`, permissions by the
//!   concatenated `(entity, app, role)` key.

pub mod abi;
pub mod entities;
pub mod errors;

pub use abi::{AbiType, AbiValue};
pub use entities::*;
pub use errors::*;
