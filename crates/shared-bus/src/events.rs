//! # Projection Events
//!
//! Defines every event that flows through the pipeline into the state
//! projector. Chain events come from the event normalizer; synthetic markers
//! come from the subscription synchronizer and the materialized store.

use serde::{Deserialize, Serialize};
use shared_types::{Address, BlockNumber, Role, U256};

/// Wire name of the global "syncing started" marker.
pub const SYNC_STATUS_SYNCING: &str = "SYNC_STATUS_SYNCING";
/// Wire name of the global "syncing finished" marker.
pub const SYNC_STATUS_SYNCED: &str = "SYNC_STATUS_SYNCED";
/// Wire name of the per-address "catch-up started" marker.
pub const SYNC_SUBSCRIPTION_SYNCING: &str = "SYNC_SUBSCRIPTION_SYNCING";
/// Wire name of the per-address "reorg-safe history folded" marker.
pub const SYNC_SUBSCRIPTION_CACHED: &str = "SYNC_SUBSCRIPTION_CACHED";
/// Wire name of the per-address "recent history folded" marker.
pub const SYNC_SUBSCRIPTION_SYNCED: &str = "SYNC_SUBSCRIPTION_SYNCED";

/// All events the projector understands.
///
/// The set is closed: log names not in the catalog arrive as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminEvent {
    // =========================================================================
    // COMMITTEES APP
    // =========================================================================
    /// A committee was installed.
    CreateCommittee {
        committee_address: Address,
        voting_address: Address,
        /// `None` when the event carried the zero address.
        finance_address: Option<Address>,
        name: String,
        description: String,
    },

    /// Committee metadata changed.
    ModifyCommitteeInfo {
        committee_address: Address,
        name: String,
        description: String,
    },

    /// A committee was removed.
    RemoveCommittee { committee_address: Address },

    // =========================================================================
    // TOKEN CONTRACTS
    // =========================================================================
    /// A committee token moved between holders.
    Transfer {
        from: Address,
        to: Address,
        amount: U256,
    },

    // =========================================================================
    // ACL
    // =========================================================================
    /// A role was granted (`allowed`) or revoked.
    SetPermission {
        entity: Address,
        app: Address,
        role: Role,
        allowed: bool,
    },

    // =========================================================================
    // SYNCHRONIZATION MARKERS
    // =========================================================================
    /// At least one watched contract started catching up.
    SyncStatusSyncing,

    /// Every watched contract finished catching up.
    SyncStatusSynced,

    /// A watched contract started catching up.
    SubscriptionSyncing,

    /// History up to `block_number` is folded and safe to resume from.
    SubscriptionCached { block_number: BlockNumber },

    /// History up to `block_number` (chain head) is folded.
    SubscriptionSynced { block_number: BlockNumber },

    // =========================================================================
    // STORE
    // =========================================================================
    /// Re-read the balances of `candidates` for a restored committee.
    RescanMembers {
        committee_address: Address,
        candidates: Vec<Address>,
    },

    /// A log whose signature is not in the catalog.
    Unknown { name: String },
}

impl AdminEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AdminEvent::CreateCommittee { .. } => "CreateCommittee",
            AdminEvent::ModifyCommitteeInfo { .. } => "ModifyCommitteeInfo",
            AdminEvent::RemoveCommittee { .. } => "RemoveCommittee",
            AdminEvent::Transfer { .. } => "Transfer",
            AdminEvent::SetPermission { .. } => "SetPermission",
            AdminEvent::SyncStatusSyncing => SYNC_STATUS_SYNCING,
            AdminEvent::SyncStatusSynced => SYNC_STATUS_SYNCED,
            AdminEvent::SubscriptionSyncing => SYNC_SUBSCRIPTION_SYNCING,
            AdminEvent::SubscriptionCached { .. } => SYNC_SUBSCRIPTION_CACHED,
            AdminEvent::SubscriptionSynced { .. } => SYNC_SUBSCRIPTION_SYNCED,
            AdminEvent::RescanMembers { .. } => "RescanMembers",
            AdminEvent::Unknown { name } => name,
        }
    }

    /// Topic for routing and metrics.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            AdminEvent::CreateCommittee { .. }
            | AdminEvent::ModifyCommitteeInfo { .. }
            | AdminEvent::RemoveCommittee { .. } => EventTopic::Committees,
            AdminEvent::Transfer { .. } | AdminEvent::RescanMembers { .. } => EventTopic::Membership,
            AdminEvent::SetPermission { .. } => EventTopic::Permissions,
            AdminEvent::SyncStatusSyncing
            | AdminEvent::SyncStatusSynced
            | AdminEvent::SubscriptionSyncing
            | AdminEvent::SubscriptionCached { .. }
            | AdminEvent::SubscriptionSynced { .. } => EventTopic::Sync,
            AdminEvent::Unknown { .. } => EventTopic::Unknown,
        }
    }

    /// Whether the event is a synthetic synchronization marker.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        self.topic() == EventTopic::Sync
    }
}

/// Event topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Committees,
    Membership,
    Permissions,
    Sync,
    Unknown,
}

impl EventTopic {
    /// Label used in metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            EventTopic::Committees => "committees",
            EventTopic::Membership => "membership",
            EventTopic::Permissions => "permissions",
            EventTopic::Sync => "sync",
            EventTopic::Unknown => "unknown",
        }
    }
}

/// An event together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub event: AdminEvent,
    /// Contract that emitted the log, or the watched contract for markers.
    pub contract_address: Address,
    pub block_number: BlockNumber,
    /// Position within the block; 0 for markers.
    pub log_index: u64,
}

impl NormalizedEvent {
    /// Build a synthetic marker for `contract_address`.
    #[must_use]
    pub fn marker(event: AdminEvent, contract_address: Address, block_number: BlockNumber) -> Self {
        Self {
            event,
            contract_address,
            block_number,
            log_index: 0,
        }
    }

    /// Wire name of the wrapped event.
    #[must_use]
    pub fn name(&self) -> &str {
        self.event.name()
    }
}

/// An event whose side effect on state was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub event: NormalizedEvent,
    pub reason: String,
}
