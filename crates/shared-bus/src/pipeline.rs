//! # Event Pipeline
//!
//! Bounded multi-producer, single-consumer queue in front of the projector.
//!
//! Every synchronizer holds a `PipelineSender` clone; the materialized store
//! owns the only `PipelineReceiver`. A full queue suspends producers, which
//! is the backpressure between chain I/O and folding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

use crate::events::NormalizedEvent;

/// Errors from pipeline operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The consumer was dropped.
    #[error("Event pipeline closed")]
    Closed,
}

/// Create a pipeline with the given capacity.
#[must_use]
pub fn event_pipeline(capacity: usize) -> (PipelineSender, PipelineReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let sent = Arc::new(AtomicU64::new(0));
    (
        PipelineSender {
            tx,
            sent: Arc::clone(&sent),
        },
        PipelineReceiver { rx, sent },
    )
}

/// Producer handle. Cheap to clone.
#[derive(Clone, Debug)]
pub struct PipelineSender {
    tx: mpsc::Sender<NormalizedEvent>,
    sent: Arc<AtomicU64>,
}

impl PipelineSender {
    /// Enqueue one event, waiting while the queue is full.
    pub async fn send(&self, event: NormalizedEvent) -> Result<(), PipelineError> {
        trace!(event = event.name(), block_number = event.block_number, "Enqueue");
        self.tx.send(event).await.map_err(|_| PipelineError::Closed)?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Whether the consumer is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots in the queue.
    #[must_use]
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// The single consumer handle.
#[derive(Debug)]
pub struct PipelineReceiver {
    rx: mpsc::Receiver<NormalizedEvent>,
    sent: Arc<AtomicU64>,
}

impl PipelineReceiver {
    /// Next event, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<NormalizedEvent> {
        self.rx.recv().await
    }

    /// Next event if one is queued.
    pub fn try_recv(&mut self) -> Option<NormalizedEvent> {
        self.rx.try_recv().ok()
    }

    /// Total events accepted by the pipeline.
    #[must_use]
    pub fn events_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}
