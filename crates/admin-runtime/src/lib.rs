//! # Committee Admin Runtime
//!
//! Runs the committee projection engine against a JSON-RPC chain node.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig`, CLI flags and environment overrides
//! - `adapters/` - JSON-RPC implementations of the chain and contract ports
//! - `runtime` - Bootstrap, wiring and shutdown
//! - `report` - Operator summaries of the state
//!
//! ```text
//!  JSON-RPC node
//!    │  eth_getLogs            eth_call
//!    ↓                            ↑
//!  Synchronizers ──→ Pipeline ──→ Store (projector) ──→ Subscribers
//!    ↑                                │
//!    └──────── watch / unwatch ───────┘
//! ```

pub mod adapters;
pub mod config;
pub mod report;
pub mod runtime;

pub use config::{Cli, ConfigError, RuntimeConfig};
pub use runtime::AdminRuntime;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
