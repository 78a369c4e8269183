//! # Normalization Errors

use shared_types::AbiError;
use thiserror::Error;

/// Why a log was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Anonymous logs carry no signature topic.
    #[error("Log has no topics")]
    MissingTopics,

    /// Pending logs are not folded.
    #[error("Log has no block number")]
    MissingBlockNumber,

    /// The node retracted the log after a reorganization.
    #[error("Log was removed by a reorganization")]
    Removed,

    /// The indexed parameters do not match the signature.
    #[error("{event}: expected {expected} topics, got {actual}")]
    TopicCount {
        event: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Topic or data words did not decode.
    #[error("{event}: {source}")]
    Decode {
        event: &'static str,
        #[source]
        source: AbiError,
    },
}

impl NormalizeError {
    /// Short label used in metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizeError::MissingTopics => "no_topics",
            NormalizeError::MissingBlockNumber => "pending",
            NormalizeError::Removed => "removed",
            NormalizeError::TopicCount { .. } => "topic_count",
            NormalizeError::Decode { .. } => "decode",
        }
    }
}
