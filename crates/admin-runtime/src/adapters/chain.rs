//! Chain log source over JSON-RPC.
//!
//! The live subscription polls `eth_getLogs` for the blocks produced since
//! the previous poll.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ca_03_subscription_sync::{ChainLogSource, LogStream, SyncError};
use futures::stream;
use shared_types::{Address, BlockNumber, LogEntry};
use tracing::trace;

use super::rpc::{JsonRpcClient, RpcError};

impl From<RpcError> for SyncError {
    fn from(error: RpcError) -> Self {
        SyncError::Source(error.to_string())
    }
}

/// `ChainLogSource` backed by a JSON-RPC node.
pub struct RpcLogSource {
    client: Arc<JsonRpcClient>,
    poll_interval: Duration,
}

impl RpcLogSource {
    pub fn new(client: Arc<JsonRpcClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }
}

struct PollState {
    client: Arc<JsonRpcClient>,
    addresses: Vec<Address>,
    next_block: BlockNumber,
    poll_interval: Duration,
    buffered: VecDeque<LogEntry>,
    first_poll: bool,
}

impl PollState {
    /// Fetch logs from `next_block` up to the head. Empty when no new block.
    async fn poll(&mut self) -> Result<(), SyncError> {
        let head = self.client.block_number().await?;
        if head < self.next_block {
            return Ok(());
        }
        let mut logs = self
            .client
            .get_logs(self.next_block, head, &self.addresses)
            .await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        trace!(from = self.next_block, to = head, logs = logs.len(), "Polled live logs");
        self.buffered.extend(logs);
        self.next_block = head + 1;
        Ok(())
    }
}

#[async_trait]
impl ChainLogSource for RpcLogSource {
    async fn block_number(&self) -> Result<BlockNumber, SyncError> {
        Ok(self.client.block_number().await?)
    }

    async fn past_logs(
        &self,
        from: BlockNumber,
        to: BlockNumber,
        addresses: &[Address],
    ) -> Result<Vec<LogEntry>, SyncError> {
        Ok(self.client.get_logs(from, to, addresses).await?)
    }

    async fn subscribe_logs(
        &self,
        from: BlockNumber,
        addresses: Vec<Address>,
    ) -> Result<LogStream, SyncError> {
        let state = PollState {
            client: Arc::clone(&self.client),
            addresses,
            next_block: from,
            poll_interval: self.poll_interval,
            buffered: VecDeque::new(),
            first_poll: true,
        };

        let logs = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(log) = state.buffered.pop_front() {
                    return Some((Ok(log), state));
                }
                if !state.first_poll {
                    tokio::time::sleep(state.poll_interval).await;
                }
                state.first_poll = false;
                if let Err(error) = state.poll().await {
                    return Some((Err(error), state));
                }
            }
        });
        Ok(Box::pin(logs))
    }
}
