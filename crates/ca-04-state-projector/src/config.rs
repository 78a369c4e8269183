//! # Projector Configuration

use ca_01_contract_reader::DEFAULT_READ_CONCURRENCY;
use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Projector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectorConfig {
    /// Only `SetPermission` logs emitted by this contract are folded.
    /// `None` accepts any emitter.
    pub acl_address: Option<Address>,
    /// Balance reads in flight during a member rescan.
    pub read_concurrency: usize,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            acl_address: None,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }
}
