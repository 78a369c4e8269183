//! # Outbound Ports
//!
//! The chain log source the synchronizer pulls from.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use futures::Stream;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, BlockNumber, LogEntry};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::domain::SyncError;

/// Live log stream. Items arrive in chain order.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogEntry, SyncError>> + Send>>;

/// Chain log source - outbound port.
#[async_trait]
pub trait ChainLogSource: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> Result<BlockNumber, SyncError>;

    /// Logs emitted by `addresses` in the inclusive range `[from, to]`.
    ///
    /// No ordering is promised.
    async fn past_logs(
        &self,
        from: BlockNumber,
        to: BlockNumber,
        addresses: &[Address],
    ) -> Result<Vec<LogEntry>, SyncError>;

    /// Logs emitted by `addresses` from block `from` onwards.
    async fn subscribe_logs(
        &self,
        from: BlockNumber,
        addresses: Vec<Address>,
    ) -> Result<LogStream, SyncError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

struct LiveSubscriber {
    from: BlockNumber,
    addresses: Vec<Address>,
    tx: mpsc::UnboundedSender<LogEntry>,
}

/// In-memory chain for testing.
///
/// History is served from `logs` in insertion order; `push_live` fans a log
/// out to every matching subscription.
#[derive(Default)]
pub struct MockChainLogSource {
    head: AtomicU64,
    logs: RwLock<Vec<LogEntry>>,
    live: Mutex<Vec<LiveSubscriber>>,
    failures_remaining: AtomicU32,
    past_log_calls: Mutex<Vec<(BlockNumber, BlockNumber)>>,
}

impl MockChainLogSource {
    #[must_use]
    pub fn new(head: BlockNumber) -> Self {
        let source = Self::default();
        source.set_head(head);
        source
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.head.store(head, Ordering::SeqCst);
    }

    /// Add a historical log.
    pub fn add_log(&self, log: LogEntry) {
        self.logs.write().push(log);
    }

    /// Fail the next `count` calls to any method.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Ranges requested through `past_logs`, in call order.
    #[must_use]
    pub fn requested_ranges(&self) -> Vec<(BlockNumber, BlockNumber)> {
        self.past_log_calls.lock().clone()
    }

    /// Number of open live subscriptions.
    #[must_use]
    pub fn live_subscribers(&self) -> usize {
        let mut live = self.live.lock();
        live.retain(|s| !s.tx.is_closed());
        live.len()
    }

    /// Deliver a log to matching live subscriptions and record it as history.
    pub fn push_live(&self, log: LogEntry) {
        let block = log.block_number.unwrap_or_default();
        let mut live = self.live.lock();
        live.retain(|s| !s.tx.is_closed());
        for subscriber in live.iter() {
            if block >= subscriber.from && subscriber.addresses.contains(&log.address) {
                let _ = subscriber.tx.send(log.clone());
            }
        }
        drop(live);
        self.add_log(log);
    }

    /// End every live subscription.
    pub fn close_live(&self) {
        self.live.lock().clear();
    }

    fn check_failure(&self) -> Result<(), SyncError> {
        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SyncError::Source("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainLogSource for MockChainLogSource {
    async fn block_number(&self) -> Result<BlockNumber, SyncError> {
        self.check_failure()?;
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn past_logs(
        &self,
        from: BlockNumber,
        to: BlockNumber,
        addresses: &[Address],
    ) -> Result<Vec<LogEntry>, SyncError> {
        self.check_failure()?;
        self.past_log_calls.lock().push((from, to));
        Ok(self
            .logs
            .read()
            .iter()
            .filter(|log| addresses.contains(&log.address))
            .filter(|log| {
                log.block_number
                    .map_or(false, |block| block >= from && block <= to)
            })
            .cloned()
            .collect())
    }

    async fn subscribe_logs(
        &self,
        from: BlockNumber,
        addresses: Vec<Address>,
    ) -> Result<LogStream, SyncError> {
        self.check_failure()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.live.lock().push(LiveSubscriber {
            from,
            addresses,
            tx,
        });
        Ok(Box::pin(UnboundedReceiverStream::new(rx).map(Ok)))
    }
}
