//! # Error Types
//!
//! Defines error types shared by the ABI codec and its callers.

use thiserror::Error;

/// Errors raised while decoding ABI words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Not enough bytes to read the requested word(s).
    #[error("Data too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A word does not fit the declared type.
    #[error("Invalid {kind} word: {reason}")]
    InvalidWord { kind: &'static str, reason: String },

    /// A string was not valid UTF-8.
    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    /// A value did not have the expected type.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
