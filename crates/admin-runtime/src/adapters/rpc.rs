//! JSON-RPC client for the chain node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use committee_telemetry::LOGS_DROPPED;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::abi::{decode_hex, encode_hex};
use shared_types::{Address, BlockNumber, Hash, LogEntry};
use thiserror::Error;
use tracing::warn;

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Errors talking to the node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with an error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Node(JsonRpcError),

    #[error("RPC response missing result")]
    MissingResult,

    #[error("Malformed RPC value: {0}")]
    Malformed(String),
}

/// A log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<Hash>,
    #[serde(default)]
    pub data: String,
    pub block_number: Option<String>,
    pub log_index: Option<String>,
    pub transaction_hash: Option<Hash>,
    #[serde(default)]
    pub removed: bool,
}

impl RpcLog {
    /// Convert to the engine's log type.
    pub fn into_entry(self) -> Result<LogEntry, RpcError> {
        let data = decode_hex(&self.data).map_err(|e| RpcError::Malformed(e.to_string()))?;
        Ok(LogEntry {
            address: self.address,
            topics: self.topics,
            data,
            block_number: self.block_number.as_deref().map(parse_hex_u64).transpose()?,
            log_index: self.log_index.as_deref().map(parse_hex_u64).transpose()?,
            transaction_hash: self.transaction_hash,
            removed: self.removed,
        })
    }
}

/// RPC client for a chain node.
pub struct JsonRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a new RPC client.
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            rpc_url,
            request_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    /// Make a JSON-RPC call.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response: JsonRpcResponse<R> = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RpcError::Node(error));
        }
        response.result.ok_or(RpcError::MissingResult)
    }

    /// eth_blockNumber - Current block height.
    pub async fn block_number(&self) -> Result<BlockNumber, RpcError> {
        let result: String = self.call("eth_blockNumber", Vec::<()>::new()).await?;
        parse_hex_u64(&result)
    }

    /// eth_getLogs - Logs emitted by `addresses` in `[from, to]`.
    pub async fn get_logs(
        &self,
        from: BlockNumber,
        to: BlockNumber,
        addresses: &[Address],
    ) -> Result<Vec<LogEntry>, RpcError> {
        let filter = json!({
            "fromBlock": format!("0x{from:x}"),
            "toBlock": format!("0x{to:x}"),
            "address": addresses,
        });
        let logs: Vec<RpcLog> = self.call("eth_getLogs", [filter]).await?;
        Ok(into_entries(logs))
    }

    /// eth_call against the latest block.
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let call = json!({
            "to": to,
            "data": encode_hex(data),
        });
        let result: String = self.call("eth_call", (call, "latest")).await?;
        decode_hex(&result).map_err(|e| RpcError::Malformed(e.to_string()))
    }
}

/// Convert a batch of logs, dropping the ones that do not parse.
pub fn into_entries(logs: Vec<RpcLog>) -> Vec<LogEntry> {
    logs.into_iter()
        .filter_map(|log| {
            let address = log.address;
            match log.into_entry() {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(address = %format!("{address:#x}"), "Dropping malformed log: {}", error);
                    LOGS_DROPPED.with_label_values(&["malformed"]).inc();
                    None
                }
            }
        })
        .collect()
}

/// Parse hex string to u64.
pub fn parse_hex_u64(s: &str) -> Result<u64, RpcError> {
    let s = s.trim_start_matches("0x");
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 16).map_err(|e| RpcError::Malformed(format!("{s}: {e}")))
}
