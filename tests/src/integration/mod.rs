//! Cross-crate integration tests.

pub mod end_to_end;
pub mod projection;
pub mod resume;
