//! # CA-01 Contract Reader
//!
//! Typed, point-in-time reads against the committee contracts.
//!
//! **Component:** 1
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! The state projector never talks to a node directly. It asks this crate
//! for values such as a token's symbol or a holder's balance, and the crate
//! turns them into calls on the `ContractCaller` port.
//!
//! | Read | Contract | Methods |
//! |------|----------|---------|
//! | `kernel_acl` | Kernel | `acl()` |
//! | `token_of`, `max_account_tokens` | Token manager | `token()`, `maxAccountTokens()` |
//! | `token_info` | Token | `symbol()`, `decimals()`, `transfersEnabled()` |
//! | `balance_of`, `balances_of` | Token | `balanceOf(address)` |
//! | `voting_params` | Voting | `supportRequiredPct()`, `minAcceptQuorumPct()`, `voteTime()` |
//! | `vault_of` | Finance | `vault()` |
//!
//! Every read is a single attempt. Retrying is the caller's decision.
//!
//! ## Module Structure
//!
//! ```text
//! ca-01-contract-reader/
//! ├── domain/          # ContractAbi descriptors, read results, errors
//! ├── ports/           # ContractCaller, AppRegistry (+ mocks)
//! └── application/     # ContractReader, RoleRegistry
//! ```

#![warn(clippy::all)]

pub mod application;
pub mod domain;
pub mod ports;

pub use application::{ContractReader, RoleRegistry, DEFAULT_READ_CONCURRENCY};
pub use domain::{
    CommitteeContracts, ContractAbi, ContractReadError, InstalledApp, MethodDescriptor,
    RoleDescriptor, TokenInfo,
};
pub use ports::{AppRegistry, ContractCaller, MockAppRegistry, MockContractCaller};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
