//! # Projection Errors

use ca_01_contract_reader::ContractReadError;
use thiserror::Error;

/// Why an event left the state unchanged.
///
/// Never escapes `reduce`; it is reported next to the unchanged state.
#[derive(Debug, Clone, Error)]
pub enum ProjectionError {
    /// An enrichment read failed.
    #[error("{event}: contract read failed: {source}")]
    Read {
        event: String,
        #[source]
        source: ContractReadError,
    },
}

impl ProjectionError {
    /// Name of the event that failed.
    #[must_use]
    pub fn event(&self) -> &str {
        match self {
            ProjectionError::Read { event, .. } => event,
        }
    }
}
