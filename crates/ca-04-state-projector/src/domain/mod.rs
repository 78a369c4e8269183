//! # Domain Module

pub mod errors;
pub mod reduction;

pub use errors::ProjectionError;
pub use reduction::{Effect, Reduction};
