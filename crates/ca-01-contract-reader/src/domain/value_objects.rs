//! # Domain Value Objects
//!
//! Results of grouped contract reads.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Role, TokenParams, VotingParams};

/// Token metadata read in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
    pub transferable: bool,
}

/// Everything a new committee record needs from chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeContracts {
    pub token_address: Address,
    pub token: TokenInfo,
    pub token_params: TokenParams,
    pub voting_params: VotingParams,
    pub finance_address: Option<Address>,
    pub vault_address: Option<Address>,
}

/// A role declared by an installed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// bytes32 role identifier.
    pub bytes: Role,
    /// Constant name, e.g. `MINT_ROLE`.
    pub name: String,
}

/// An app installed in the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub proxy_address: Address,
    pub name: String,
    pub roles: Vec<RoleDescriptor>,
}
