//! Contract calls over JSON-RPC `eth_call`.

use std::sync::Arc;

use async_trait::async_trait;
use ca_01_contract_reader::{ContractAbi, ContractCaller, ContractReadError};
use shared_types::abi::{decode, encode_call};
use shared_types::{AbiValue, Address};

use super::rpc::{JsonRpcClient, RpcError};

/// `ContractCaller` backed by a JSON-RPC node.
pub struct RpcContractCaller {
    client: Arc<JsonRpcClient>,
}

impl RpcContractCaller {
    pub fn new(client: Arc<JsonRpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractCaller for RpcContractCaller {
    async fn call(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
        args: &[AbiValue],
    ) -> Result<AbiValue, ContractReadError> {
        let descriptor = abi.method(method).ok_or_else(|| ContractReadError::UnknownMethod {
            abi,
            method: method.to_string(),
        })?;
        let call_failed = |reason: String| ContractReadError::CallFailed {
            contract,
            method: method.to_string(),
            reason,
        };

        let data = encode_call(&descriptor.signature(), args);
        let output = self
            .client
            .eth_call(contract, &data)
            .await
            .map_err(|error| match error {
                RpcError::Http(e) => ContractReadError::Network(e.to_string()),
                other => call_failed(other.to_string()),
            })?;

        if output.is_empty() {
            return Err(call_failed("empty return data".to_string()));
        }

        decode(&[descriptor.output], &output)?
            .pop()
            .ok_or_else(|| call_failed("no return value".to_string()))
    }
}
