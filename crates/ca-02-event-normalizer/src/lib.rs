//! # CA-02 Event Normalizer
//!
//! Decodes raw chain logs into the closed `AdminEvent` set.
//!
//! **Component:** 2
//!
//! ## Rules
//!
//! | Log | Outcome |
//! |-----|---------|
//! | no topics | dropped |
//! | no block number (pending) | dropped |
//! | `removed` set by the node | dropped |
//! | topics/data do not decode | dropped |
//! | `topics[0]` not in the catalog | `AdminEvent::Unknown` |
//! | otherwise | typed event |
//!
//! Dropped logs are logged at `warn` and counted; nothing is raised.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod application;
pub mod domain;

pub use application::EventNormalizer;
pub use domain::{EventDescriptor, EventParam, NormalizeError, CATALOG};
