//! # Contract Descriptions
//!
//! ABI-like descriptors for the read-only methods the engine calls.

use serde::{Deserialize, Serialize};
use shared_types::abi::{signature, AbiType};

/// Contracts the reader knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractAbi {
    /// DAO kernel (resolves the ACL).
    Kernel,
    /// MiniMe token.
    Token,
    /// Token manager app (the committee address).
    TokenManager,
    /// Voting app.
    Voting,
    /// Finance app.
    Finance,
}

/// One read-only method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub inputs: &'static [AbiType],
    pub output: AbiType,
}

impl MethodDescriptor {
    const fn new(name: &'static str, inputs: &'static [AbiType], output: AbiType) -> Self {
        Self {
            name,
            inputs,
            output,
        }
    }

    /// Canonical signature, e.g. `balanceOf(address)`.
    #[must_use]
    pub fn signature(&self) -> String {
        signature(self.name, self.inputs)
    }
}

const KERNEL_METHODS: &[MethodDescriptor] =
    &[MethodDescriptor::new("acl", &[], AbiType::Address)];

const TOKEN_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::new("name", &[], AbiType::String),
    MethodDescriptor::new("symbol", &[], AbiType::String),
    MethodDescriptor::new("decimals", &[], AbiType::Uint8),
    MethodDescriptor::new("transfersEnabled", &[], AbiType::Bool),
    MethodDescriptor::new("totalSupply", &[], AbiType::Uint256),
    MethodDescriptor::new("balanceOf", &[AbiType::Address], AbiType::Uint256),
];

const TOKEN_MANAGER_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::new("token", &[], AbiType::Address),
    MethodDescriptor::new("maxAccountTokens", &[], AbiType::Uint256),
];

const VOTING_METHODS: &[MethodDescriptor] = &[
    MethodDescriptor::new("supportRequiredPct", &[], AbiType::Uint256),
    MethodDescriptor::new("minAcceptQuorumPct", &[], AbiType::Uint256),
    MethodDescriptor::new("voteTime", &[], AbiType::Uint256),
];

const FINANCE_METHODS: &[MethodDescriptor] =
    &[MethodDescriptor::new("vault", &[], AbiType::Address)];

impl ContractAbi {
    /// Every method of this contract.
    #[must_use]
    pub fn methods(&self) -> &'static [MethodDescriptor] {
        match self {
            ContractAbi::Kernel => KERNEL_METHODS,
            ContractAbi::Token => TOKEN_METHODS,
            ContractAbi::TokenManager => TOKEN_MANAGER_METHODS,
            ContractAbi::Voting => VOTING_METHODS,
            ContractAbi::Finance => FINANCE_METHODS,
        }
    }

    /// Look up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.methods().iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ContractAbi::Kernel => "kernel",
            ContractAbi::Token => "token",
            ContractAbi::TokenManager => "token-manager",
            ContractAbi::Voting => "voting",
            ContractAbi::Finance => "finance",
        }
    }
}
