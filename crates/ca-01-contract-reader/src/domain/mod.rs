//! # Domain Module
//!
//! Contract descriptions, read results and errors.

pub mod contracts;
pub mod errors;
pub mod value_objects;

pub use contracts::*;
pub use errors::*;
pub use value_objects::*;
