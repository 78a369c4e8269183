//! # Application Module
//!
//! Typed reads and the role registry built on the outbound ports.

pub mod reader;
pub mod roles;

pub use reader::{ContractReader, DEFAULT_READ_CONCURRENCY};
pub use roles::RoleRegistry;
