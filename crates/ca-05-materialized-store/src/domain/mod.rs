//! # Domain Module

pub mod dead_letters;
pub mod errors;
pub mod restore;

pub use dead_letters::DeadLetterLog;
pub use errors::StoreError;
pub use restore::{restore, Restored};
