//! # Application Module
//!
//! The per-address synchronizer and the manager that runs many of them.

pub mod manager;
pub mod synchronizer;

pub use manager::SubscriptionManager;
pub use synchronizer::{CatchUp, SubscriptionSynchronizer};
