//! # Application Layer

pub mod projector;

pub use projector::StateProjector;
