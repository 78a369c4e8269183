//! # Core Domain Entities
//!
//! Defines the committee data model and the single application-wide state
//! aggregate folded by the state projector.
//!
//! ## Clusters
//!
//! - **Chain**: `Address`, `Hash`, `BlockNumber`, `LogEntry`
//! - **Committees**: `Committee`, `Member`, `TokenParams`, `VotingParams`
//! - **Permissions**: `Permission`, `PermissionKey`
//! - **Synchronization**: `SubscriptionCacheRecord`, `SubscriptionPhase`
//! - **Aggregate**: `AppState`

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export primitive types for use across all components
pub use primitive_types::{H160 as Address, H256 as Hash, U256};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// Block height on the chain.
pub type BlockNumber = u64;

/// A bytes32 role identifier as stored by the ACL.
pub type Role = Hash;

/// A raw log entry as returned by the chain node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<Hash>,
    /// Non-indexed, ABI encoded data.
    pub data: Vec<u8>,
    /// Block containing the log (`None` for pending logs).
    pub block_number: Option<BlockNumber>,
    /// Position of the log within its block.
    pub log_index: Option<u64>,
    /// Transaction that emitted the log.
    pub transaction_hash: Option<Hash>,
    /// Set by the node when the log was removed by a reorganization.
    #[serde(default)]
    pub removed: bool,
}

/// Lowercase, 0x-prefixed, full-length hex rendering of an address.
#[must_use]
pub fn address_hex(address: &Address) -> String {
    format!("{address:#x}")
}

// =============================================================================
// CLUSTER B: COMMITTEES
// =============================================================================

/// Token behaviour of a committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenParams {
    /// Whether members may transfer their tokens.
    pub transferable: bool,
    /// One member, one unit (membership-style) when set.
    pub unique: bool,
}

impl TokenParams {
    /// Classify the committee by its token behaviour.
    #[must_use]
    pub fn committee_type(&self) -> CommitteeType {
        match (self.transferable, self.unique) {
            (false, false) => CommitteeType::Reputation,
            (false, true) => CommitteeType::Membership,
            (true, false) => CommitteeType::Equity,
            (true, true) => CommitteeType::TransferableMembership,
        }
    }
}

/// Committee kind derived from `TokenParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitteeType {
    /// Non-transferable, one unit per member.
    Membership,
    /// Transferable, weighted stakes.
    Equity,
    /// Non-transferable, weighted stakes.
    Reputation,
    /// Transferable, one unit per member.
    TransferableMembership,
}

impl CommitteeType {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CommitteeType::Membership => "Membership",
            CommitteeType::Equity => "Equity",
            CommitteeType::Reputation => "Reputation",
            CommitteeType::TransferableMembership => "Transferable membership",
        }
    }
}

/// Voting rules of a committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VotingParams {
    /// Required support, in percent.
    pub support_pct: u64,
    /// Minimum acceptance quorum, in percent.
    pub acceptance_pct: u64,
    /// Vote duration, in days.
    pub duration_days: u64,
}

impl VotingParams {
    /// Classify the voting rules.
    #[must_use]
    pub fn voting_type(&self) -> VotingType {
        match (self.support_pct, self.acceptance_pct) {
            (99, 99) => VotingType::Consensus,
            (50, 50) => VotingType::AbsoluteMajority,
            (50, 15) => VotingType::SimpleMajority,
            _ => VotingType::Custom,
        }
    }
}

/// Named voting presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingType {
    Consensus,
    AbsoluteMajority,
    SimpleMajority,
    Custom,
}

impl VotingType {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            VotingType::Consensus => "Consensus",
            VotingType::AbsoluteMajority => "Absolute Majority",
            VotingType::SimpleMajority => "Simple Majority",
            VotingType::Custom => "Custom Voting",
        }
    }
}

/// A committee member: `(address, stake)`.
///
/// Serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member(pub Address, pub U256);

impl Member {
    /// Member address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }

    /// Member stake (raw token balance, or 1 for unique tokens).
    #[must_use]
    pub fn stake(&self) -> U256 {
        self.1
    }
}

/// One administrative sub-unit.
///
/// `address` is assigned once at creation and never changes. The contract
/// addresses are immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Committee {
    /// Primary key (the committee's token manager app).
    pub address: Address,
    pub name: String,
    pub description: String,
    pub token_address: Address,
    pub voting_address: Address,
    #[serde(default)]
    pub finance_address: Option<Address>,
    #[serde(default)]
    pub vault_address: Option<Address>,
    pub token_params: TokenParams,
    pub voting_params: VotingParams,
    pub token_symbol: String,
    #[serde(default)]
    pub token_decimals: u8,
    /// Ordered, address-unique, stake > 0.
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Committee {
    /// Human readable token name.
    #[must_use]
    pub fn token_name(&self) -> String {
        format!("{} Token", self.token_symbol)
    }

    /// Committee kind.
    #[must_use]
    pub fn committee_type(&self) -> CommitteeType {
        self.token_params.committee_type()
    }

    /// Stake held by `address`, if it is a member.
    #[must_use]
    pub fn stake_of(&self, address: &Address) -> Option<U256> {
        self.members
            .iter()
            .find(|member| member.0 == *address)
            .map(Member::stake)
    }

    /// Addresses of the current members, in order.
    #[must_use]
    pub fn member_addresses(&self) -> Vec<Address> {
        self.members.iter().map(Member::address).collect()
    }
}

// =============================================================================
// CLUSTER C: PERMISSIONS
// =============================================================================

/// A role granted to `entity` on `app`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub entity: Address,
    pub app: Address,
    pub role: Role,
}

impl Permission {
    /// Map key of this permission.
    #[must_use]
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(&self.entity, &self.app, &self.role)
    }
}

/// Concatenation of entity, app and role as lowercase hex strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionKey(String);

impl PermissionKey {
    #[must_use]
    pub fn new(entity: &Address, app: &Address, role: &Role) -> Self {
        Self(format!("{}{}{role:#x}", address_hex(entity), address_hex(app)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER D: SYNCHRONIZATION
// =============================================================================

/// Catch-up progress of one watched contract.
///
/// Transitions are monotonic: `Unsynced -> Syncing -> Cached -> Synced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPhase {
    #[default]
    Unsynced,
    Syncing,
    Cached,
    Synced,
}

/// Persisted per-address sync record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCacheRecord {
    pub is_syncing: bool,
    /// Last reorg-safe height already folded. Never decreases.
    pub block_number: BlockNumber,
    #[serde(default)]
    pub phase: SubscriptionPhase,
}

impl SubscriptionCacheRecord {
    /// First block a resumed synchronizer must request.
    #[must_use]
    pub fn resume_from(&self) -> BlockNumber {
        self.block_number.saturating_add(1)
    }
}

// =============================================================================
// AGGREGATE
// =============================================================================

/// The single application-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub committees: Vec<Committee>,
    /// `None` values are tombstones written by revocations.
    pub permissions: BTreeMap<PermissionKey, Option<Permission>>,
    pub cached_subscriptions: BTreeMap<Address, SubscriptionCacheRecord>,
    pub is_syncing: bool,
}

impl AppState {
    /// Committee with the given address.
    #[must_use]
    pub fn committee(&self, address: &Address) -> Option<&Committee> {
        self.committees.iter().find(|c| c.address == *address)
    }

    /// Committee whose token lives at `token`.
    #[must_use]
    pub fn committee_by_token(&self, token: &Address) -> Option<&Committee> {
        self.committees.iter().find(|c| c.token_address == *token)
    }

    /// Grants that are currently in effect.
    pub fn effective_permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values().flatten()
    }

    /// Live grants held by the committee's token manager and by its voting
    /// app, in that order.
    #[must_use]
    pub fn committee_permissions(&self, committee: &Committee) -> (Vec<Permission>, Vec<Permission>) {
        let held_by = |entity: Address| {
            self.effective_permissions()
                .filter(|p| p.entity == entity)
                .cloned()
                .collect::<Vec<_>>()
        };
        (held_by(committee.address), held_by(committee.voting_address))
    }

    /// Sync record for `address`.
    #[must_use]
    pub fn subscription(&self, address: &Address) -> Option<&SubscriptionCacheRecord> {
        self.cached_subscriptions.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committee(address: u64, voting: u64) -> Committee {
        Committee {
            address: Address::from_low_u64_be(address),
            name: "Finance".into(),
            description: String::new(),
            token_address: Address::from_low_u64_be(address + 100),
            voting_address: Address::from_low_u64_be(voting),
            finance_address: None,
            vault_address: None,
            token_params: TokenParams::default(),
            voting_params: VotingParams::default(),
            token_symbol: "FT".into(),
            token_decimals: 0,
            members: vec![],
        }
    }

    #[test]
    fn test_committee_type_classification() {
        let t = |transferable, unique| TokenParams { transferable, unique }.committee_type();
        assert_eq!(t(false, true), CommitteeType::Membership);
        assert_eq!(t(true, false), CommitteeType::Equity);
        assert_eq!(t(false, false), CommitteeType::Reputation);
        assert_eq!(t(true, true).name(), "Transferable membership");
    }

    #[test]
    fn test_voting_type_classification() {
        let v = |support_pct, acceptance_pct| VotingParams {
            support_pct,
            acceptance_pct,
            duration_days: 30,
        };
        assert_eq!(v(99, 99).voting_type(), VotingType::Consensus);
        assert_eq!(v(50, 50).voting_type(), VotingType::AbsoluteMajority);
        assert_eq!(v(50, 15).voting_type(), VotingType::SimpleMajority);
        assert_eq!(v(60, 10).voting_type().name(), "Custom Voting");
    }

    #[test]
    fn test_token_name() {
        assert_eq!(committee(1, 2).token_name(), "FT Token");
    }

    #[test]
    fn test_permission_key_is_lowercase_concatenation() {
        let key = PermissionKey::new(
            &Address::from_low_u64_be(0xAB),
            &Address::from_low_u64_be(0xCD),
            &Role::from_low_u64_be(1),
        );
        assert!(key.as_str().starts_with("0x00000000000000000000000000000000000000ab0x"));
        assert!(key.as_str().ends_with("01"));
        assert_eq!(key.as_str().len(), 42 + 42 + 66);
    }

    #[test]
    fn test_committee_permissions_skip_tombstones() {
        let c = committee(1, 2);
        let mut state = AppState {
            committees: vec![c.clone()],
            ..Default::default()
        };
        let live = Permission {
            entity: c.address,
            app: Address::from_low_u64_be(9),
            role: Role::from_low_u64_be(1),
        };
        let voting = Permission {
            entity: c.voting_address,
            app: Address::from_low_u64_be(9),
            role: Role::from_low_u64_be(2),
        };
        state.permissions.insert(live.key(), Some(live.clone()));
        state.permissions.insert(voting.key(), Some(voting.clone()));
        state.permissions.insert(
            PermissionKey::new(&c.address, &Address::from_low_u64_be(9), &Role::from_low_u64_be(3)),
            None,
        );

        let (token_manager, voting_app) = state.committee_permissions(&c);
        assert_eq!(token_manager, vec![live]);
        assert_eq!(voting_app, vec![voting]);
    }

    #[test]
    fn test_state_json_roundtrip_keeps_tombstones() {
        let mut state = AppState::default();
        let key = PermissionKey::new(&Address::zero(), &Address::zero(), &Role::zero());
        state.permissions.insert(key.clone(), None);
        state.cached_subscriptions.insert(
            Address::from_low_u64_be(7),
            SubscriptionCacheRecord {
                is_syncing: false,
                block_number: 42,
                phase: SubscriptionPhase::Cached,
            },
        );

        let json = serde_json::to_string(&state).unwrap();
        let back: AppState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.permissions.get(&key), Some(&None));
    }

    #[test]
    fn test_resume_from_is_next_block() {
        let record = SubscriptionCacheRecord {
            block_number: 41,
            ..Default::default()
        };
        assert_eq!(record.resume_from(), 42);
    }
}
