//! # Application Module

pub mod normalizer;

pub use normalizer::EventNormalizer;
