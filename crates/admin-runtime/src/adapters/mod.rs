//! # Adapters
//!
//! Port implementations connecting the engine to a JSON-RPC node.

pub mod apps;
pub mod chain;
pub mod contracts;
pub mod rpc;

pub use apps::FileAppRegistry;
pub use chain::RpcLogSource;
pub use contracts::RpcContractCaller;
pub use rpc::{JsonRpcClient, RpcError};
