//! # Domain Module
//!
//! Event catalog and normalization errors.

pub mod catalog;
pub mod errors;

pub use catalog::*;
pub use errors::*;
