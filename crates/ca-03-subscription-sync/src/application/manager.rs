//! # Subscription Manager
//!
//! Owns one synchronizer task per watched address and the global sync
//! status. `SYNC_STATUS_SYNCING` is sent when the first address starts
//! catching up and `SYNC_STATUS_SYNCED` when the last one finishes.
//! A synchronizer that fails is restarted from the last height it reached.

use std::collections::HashMap;
use std::sync::Arc;

use committee_telemetry::{ACTIVE_SUBSCRIPTIONS, SYNC_RESTARTS};
use parking_lot::Mutex;
use shared_bus::{AdminEvent, NormalizedEvent};
use shared_types::{Address, BlockNumber};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::SubscriptionSynchronizer;
use crate::domain::SyncError;
use crate::ports::ChainLogSource;

struct Watch {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner<S: ChainLogSource + ?Sized> {
    synchronizer: SubscriptionSynchronizer<S>,
    root: CancellationToken,
    watches: Mutex<HashMap<Address, Watch>>,
    /// Synchronizers still in phases A/B.
    catching_up: tokio::sync::Mutex<usize>,
}

/// Starts, tracks and stops synchronizers.
pub struct SubscriptionManager<S: ChainLogSource + ?Sized + 'static> {
    inner: Arc<Inner<S>>,
}

impl<S: ChainLogSource + ?Sized + 'static> Clone for SubscriptionManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ChainLogSource + ?Sized + 'static> SubscriptionManager<S> {
    /// Every task is cancelled when `root` is.
    pub fn new(synchronizer: SubscriptionSynchronizer<S>, root: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                synchronizer,
                root,
                watches: Mutex::new(HashMap::new()),
                catching_up: tokio::sync::Mutex::new(0),
            }),
        }
    }

    /// Start synchronizing `address`, resuming after `cached` when given.
    ///
    /// Returns `false` if the address is already watched.
    pub fn watch(&self, address: Address, cached: Option<BlockNumber>) -> bool {
        let mut watches = self.inner.watches.lock();
        if let Some(existing) = watches.get(&address) {
            if !existing.task.is_finished() {
                debug!(address = %format!("{address:#x}"), "Already watched");
                return false;
            }
        }

        let cancel = self.inner.root.child_token();
        let inner = Arc::clone(&self.inner);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            inner.drive(address, cached, task_cancel).await;
        });

        info!(address = %format!("{address:#x}"), ?cached, "Watching contract");
        watches.insert(address, Watch { cancel, task });
        ACTIVE_SUBSCRIPTIONS.set(watches.len() as i64);
        true
    }

    /// Stop synchronizing `address`. Returns `false` if it was not watched.
    pub fn unwatch(&self, address: &Address) -> bool {
        let mut watches = self.inner.watches.lock();
        let Some(watch) = watches.remove(address) else {
            return false;
        };
        watch.cancel.cancel();
        ACTIVE_SUBSCRIPTIONS.set(watches.len() as i64);
        info!(address = %format!("{address:#x}"), "Unwatched contract");
        true
    }

    #[must_use]
    pub fn is_watching(&self, address: &Address) -> bool {
        self.inner
            .watches
            .lock()
            .get(address)
            .map_or(false, |w| !w.task.is_finished())
    }

    /// Watched addresses, sorted.
    #[must_use]
    pub fn watched(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.inner.watches.lock().keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Synchronizers still catching up.
    pub async fn catching_up(&self) -> usize {
        *self.inner.catching_up.lock().await
    }

    /// Cancel every synchronizer and wait for the tasks to exit.
    pub async fn shutdown(&self) {
        self.inner.root.cancel();
        let tasks: Vec<_> = self
            .inner
            .watches
            .lock()
            .drain()
            .map(|(_, watch)| watch.task)
            .collect();
        ACTIVE_SUBSCRIPTIONS.set(0);
        for task in tasks {
            let _ = task.await;
        }
    }
}

impl<S: ChainLogSource + ?Sized> Inner<S> {
    /// Catch up and follow `address` until cancelled.
    ///
    /// A failed run is restarted after a backoff delay. The address counts
    /// as catching up until a run completes phases A and B, so the global
    /// `SYNC_STATUS_SYNCED` is never sent for a run that gave up.
    async fn drive(&self, address: Address, cached: Option<BlockNumber>, cancel: CancellationToken) {
        let mut resume = cached;
        let mut restarts: u32 = 0;
        let mut catching_up = true;
        self.begin_catch_up(address).await;

        loop {
            let result = match self.synchronizer.catch_up(address, resume, &cancel).await {
                Ok(done) => {
                    if catching_up {
                        self.end_catch_up(address).await;
                        catching_up = false;
                    }
                    restarts = 0;
                    resume = Some(done.plan.cache_height);
                    self.synchronizer
                        .follow(address, done.plan.live_from, &cancel)
                        .await
                }
                Err(error) => Err(error),
            };

            match result {
                Ok(()) | Err(SyncError::Cancelled) => {
                    debug!(address = %format!("{address:#x}"), "Synchronizer stopped");
                    break;
                }
                Err(SyncError::PipelineClosed) => {
                    debug!(address = %format!("{address:#x}"), "Pipeline closed, synchronizer stopped");
                    break;
                }
                Err(error) => {
                    let delay = self.synchronizer.config().backoff.delay(restarts);
                    error!(
                        address = %format!("{address:#x}"),
                        ?resume,
                        delay_ms = delay.as_millis() as u64,
                        "Synchronizer failed, restarting: {}",
                        error
                    );
                    SYNC_RESTARTS.inc();
                    restarts = restarts.saturating_add(1);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    if !catching_up {
                        self.begin_catch_up(address).await;
                        catching_up = true;
                    }
                }
            }
        }

        if catching_up {
            self.end_catch_up(address).await;
        }
    }

    async fn begin_catch_up(&self, address: Address) {
        let mut count = self.catching_up.lock().await;
        *count += 1;
        if *count == 1 {
            self.send_status(AdminEvent::SyncStatusSyncing, address).await;
        }
    }

    async fn end_catch_up(&self, address: Address) {
        let mut count = self.catching_up.lock().await;
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.send_status(AdminEvent::SyncStatusSynced, address).await;
        }
    }

    /// Sent while holding the counter lock so markers never cross.
    async fn send_status(&self, event: AdminEvent, address: Address) {
        let marker = NormalizedEvent::marker(event, address, 0);
        let sent = tokio::select! {
            _ = self.root.cancelled() => return,
            sent = self.synchronizer.pipeline().send(marker) => sent,
        };
        if sent.is_err() {
            debug!("Pipeline closed before sync status could be sent");
        }
    }
}
