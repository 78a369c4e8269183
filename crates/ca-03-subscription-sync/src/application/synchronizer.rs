//! # Subscription Synchronizer
//!
//! Produces the ordered event sequence of one contract address:
//!
//! 1. `SYNC_SUBSCRIPTION_SYNCING`
//! 2. Phase A logs (settled history), then `SYNC_SUBSCRIPTION_CACHED`
//! 3. Phase B logs (recent history), then `SYNC_SUBSCRIPTION_SYNCED`
//! 4. Phase C live logs until cancelled
//!
//! Each phase starts where the previous one ended, so every log is sent once.

use std::future::Future;
use std::sync::Arc;

use ca_02_event_normalizer::EventNormalizer;
use committee_telemetry::{LOGS_DROPPED, LOGS_FETCHED};
use futures::StreamExt;
use shared_bus::{AdminEvent, NormalizedEvent, PipelineSender};
use shared_types::{Address, BlockNumber, LogEntry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::domain::{plan_sync, retry_with_backoff, BlockRange, SyncError, SyncPlan};
use crate::ports::ChainLogSource;

/// Result of a completed catch-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchUp {
    pub plan: SyncPlan,
    /// Logs sent during phases A and B.
    pub events_sent: u64,
}

/// Replays and follows the logs of watched contracts.
pub struct SubscriptionSynchronizer<S: ChainLogSource + ?Sized> {
    source: Arc<S>,
    normalizer: Arc<EventNormalizer>,
    pipeline: PipelineSender,
    config: SyncConfig,
}

impl<S: ChainLogSource + ?Sized> SubscriptionSynchronizer<S> {
    pub fn new(
        source: Arc<S>,
        normalizer: Arc<EventNormalizer>,
        pipeline: PipelineSender,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            normalizer,
            pipeline,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Handle on the shared pipeline.
    pub fn pipeline(&self) -> &PipelineSender {
        &self.pipeline
    }

    /// Run phases A and B for `address`.
    ///
    /// `cached` is the height of the persisted record, if any.
    pub async fn catch_up(
        &self,
        address: Address,
        cached: Option<BlockNumber>,
        cancel: &CancellationToken,
    ) -> Result<CatchUp, SyncError> {
        let head = self
            .retrying("block_number", cancel, || self.source.block_number())
            .await?;
        let plan = plan_sync(head, cached, &self.config);
        info!(
            address = %format!("{address:#x}"),
            head,
            cache_height = plan.cache_height,
            "Catching up"
        );

        self.emit(
            NormalizedEvent::marker(AdminEvent::SubscriptionSyncing, address, plan.cache_height),
            cancel,
        )
        .await?;

        let mut events_sent = 0;
        if let Some(range) = plan.cached_range {
            events_sent += self.replay(address, range, "cached", cancel).await?;
        }
        self.emit(
            NormalizedEvent::marker(
                AdminEvent::SubscriptionCached {
                    block_number: plan.cache_height,
                },
                address,
                plan.cache_height,
            ),
            cancel,
        )
        .await?;

        if let Some(range) = plan.recent_range {
            events_sent += self.replay(address, range, "recent", cancel).await?;
        }
        self.emit(
            NormalizedEvent::marker(
                AdminEvent::SubscriptionSynced { block_number: head },
                address,
                head,
            ),
            cancel,
        )
        .await?;

        debug!(address = %format!("{address:#x}"), events_sent, "Caught up");
        Ok(CatchUp { plan, events_sent })
    }

    /// Phase C: forward live logs from `live_from` until cancelled.
    pub async fn follow(
        &self,
        address: Address,
        live_from: BlockNumber,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        let mut stream = self
            .retrying("subscribe_logs", cancel, || {
                self.source.subscribe_logs(live_from, vec![address])
            })
            .await?;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(log)) => {
                    if log.block_number.map_or(false, |block| block < live_from) {
                        continue;
                    }
                    LOGS_FETCHED.with_label_values(&["live"]).inc();
                    self.forward(&log, cancel).await?;
                }
                Some(Err(error)) => {
                    warn!(address = %format!("{address:#x}"), "Live subscription error: {}", error);
                }
                None => return Err(SyncError::StreamEnded { address }),
            }
        }
    }

    /// Catch up, then follow.
    pub async fn run(
        &self,
        address: Address,
        cached: Option<BlockNumber>,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        let catch_up = self.catch_up(address, cached, cancel).await?;
        self.follow(address, catch_up.plan.live_from, cancel).await
    }

    async fn replay(
        &self,
        address: Address,
        range: BlockRange,
        phase: &'static str,
        cancel: &CancellationToken,
    ) -> Result<u64, SyncError> {
        let addresses = [address];
        let mut sent = 0;

        for chunk in range.chunks(self.config.log_batch_size) {
            let mut logs = self
                .retrying("past_logs", cancel, || {
                    self.source.past_logs(chunk.from, chunk.to, &addresses)
                })
                .await?;
            logs.sort_by_key(|log| (log.block_number, log.log_index));
            LOGS_FETCHED
                .with_label_values(&[phase])
                .inc_by(logs.len() as u64);
            debug!(
                address = %format!("{address:#x}"),
                from = chunk.from,
                to = chunk.to,
                logs = logs.len(),
                phase,
                "Fetched history"
            );

            for log in &logs {
                if self.forward(log, cancel).await? {
                    sent += 1;
                }
            }
        }
        Ok(sent)
    }

    /// Normalize and send one log. Returns whether it was sent.
    async fn forward(&self, log: &LogEntry, cancel: &CancellationToken) -> Result<bool, SyncError> {
        match self.normalizer.try_normalize(log) {
            Ok(event) => {
                self.emit(event, cancel).await?;
                Ok(true)
            }
            Err(error) => {
                self.normalizer.record_drop(log, &error);
                LOGS_DROPPED.with_label_values(&[error.reason()]).inc();
                Ok(false)
            }
        }
    }

    async fn emit(&self, event: NormalizedEvent, cancel: &CancellationToken) -> Result<(), SyncError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.pipeline.send(event) => result.map_err(SyncError::from),
        }
    }

    async fn retrying<T, F, Fut>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        tokio::select! {
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = retry_with_backoff(&self.config.backoff, name, operation) => result,
        }
    }
}
