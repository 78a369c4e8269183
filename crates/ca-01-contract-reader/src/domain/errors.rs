//! # Domain Errors
//!
//! Error types for contract reads.

use shared_types::{AbiError, Address};
use thiserror::Error;

use super::contracts::ContractAbi;

/// Contract read error types.
#[derive(Debug, Clone, Error)]
pub enum ContractReadError {
    /// The method is not part of the contract description.
    #[error("Unknown method {method} on {abi:?}")]
    UnknownMethod {
        /// Contract description used
        abi: ContractAbi,
        /// Requested method
        method: String,
    },

    /// The call reverted or the node refused it.
    #[error("Call {method} on {contract:#x} failed: {reason}")]
    CallFailed {
        /// Called contract
        contract: Address,
        /// Called method
        method: String,
        /// Reason reported by the caller
        reason: String,
    },

    /// Transport failure while talking to the node.
    #[error("Network error: {0}")]
    Network(String),

    /// The returned data did not decode.
    #[error("Decode error: {0}")]
    Decode(#[from] AbiError),

    /// A decoded value is outside the expected domain.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field being read
        field: &'static str,
        /// What was wrong
        reason: String,
    },
}
