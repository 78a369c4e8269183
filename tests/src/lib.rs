//! # Committee Admin Test Suite
//!
//! Unified test crate exercising the crates together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Chain logs and contract mocks for one organization
//! └── integration/
//!     ├── projection.rs # Folding properties over the projector and store
//!     ├── resume.rs     # Restart from a persisted snapshot
//!     └── end_to_end.rs # Mock chain -> synchronizers -> store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ca-tests
//! cargo test -p ca-tests integration::resume::
//! ```

pub mod fixtures;
pub mod integration;
