//! # Ports Module
//!
//! Outbound dependencies of the reader (contract calls, app registry).

pub mod outbound;

pub use outbound::*;
