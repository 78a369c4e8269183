//! # Event Catalog
//!
//! Signatures of the logs the engine understands. Event and parameter
//! names are the wire contract with the deployed contracts.

use shared_types::abi::{keccak256, signature, AbiType};
use shared_types::Hash;

/// One event parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventParam {
    pub name: &'static str,
    pub kind: AbiType,
    /// Carried in a topic rather than in the data section.
    pub indexed: bool,
}

const fn param(name: &'static str, kind: AbiType) -> EventParam {
    EventParam {
        name,
        kind,
        indexed: false,
    }
}

const fn indexed(name: &'static str, kind: AbiType) -> EventParam {
    EventParam {
        name,
        kind,
        indexed: true,
    }
}

/// A log signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    pub name: &'static str,
    pub params: &'static [EventParam],
}

impl EventDescriptor {
    /// Canonical signature, e.g. `RemoveCommittee(address)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let kinds: Vec<AbiType> = self.params.iter().map(|p| p.kind).collect();
        signature(self.name, &kinds)
    }

    /// `topics[0]` of logs with this signature.
    #[must_use]
    pub fn topic(&self) -> Hash {
        keccak256(self.signature().as_bytes())
    }

    /// Number of topics a matching log carries, signature included.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        1 + self.params.iter().filter(|p| p.indexed).count()
    }

    /// Position of `name` among the parameters.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

pub const CREATE_COMMITTEE: EventDescriptor = EventDescriptor {
    name: "CreateCommittee",
    params: &[
        param("committeeAddress", AbiType::Address),
        param("votingAddress", AbiType::Address),
        param("financeAddress", AbiType::Address),
        param("name", AbiType::Bytes32),
        param("description", AbiType::String),
    ],
};

pub const MODIFY_COMMITTEE_INFO: EventDescriptor = EventDescriptor {
    name: "ModifyCommitteeInfo",
    params: &[
        param("committeeAddress", AbiType::Address),
        param("name", AbiType::Bytes32),
        param("description", AbiType::String),
    ],
};

pub const REMOVE_COMMITTEE: EventDescriptor = EventDescriptor {
    name: "RemoveCommittee",
    params: &[param("committeeAddress", AbiType::Address)],
};

pub const TRANSFER: EventDescriptor = EventDescriptor {
    name: "Transfer",
    params: &[
        indexed("_from", AbiType::Address),
        indexed("_to", AbiType::Address),
        param("_amount", AbiType::Uint256),
    ],
};

pub const SET_PERMISSION: EventDescriptor = EventDescriptor {
    name: "SetPermission",
    params: &[
        indexed("entity", AbiType::Address),
        indexed("app", AbiType::Address),
        indexed("role", AbiType::Bytes32),
        param("allowed", AbiType::Bool),
    ],
};

/// Every recognized log signature.
pub const CATALOG: &[EventDescriptor] = &[
    CREATE_COMMITTEE,
    MODIFY_COMMITTEE_INFO,
    REMOVE_COMMITTEE,
    TRANSFER,
    SET_PERMISSION,
];
