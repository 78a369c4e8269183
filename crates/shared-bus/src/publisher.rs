//! # State Publisher
//!
//! Republishes each new materialized state to every subscriber.
//!
//! Uses `tokio::sync::watch`: subscribers always see the latest snapshot and
//! never block the store. Intermediate snapshots may be skipped by slow
//! readers, which is fine for a view that is re-rendered from scratch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared_types::AppState;
use tokio::sync::watch;
use tracing::debug;

use crate::subscriber::StateSubscription;

/// Publishing side of the state stream.
pub struct StatePublisher {
    sender: watch::Sender<Arc<AppState>>,
    /// Total snapshots published.
    version: AtomicU64,
}

impl StatePublisher {
    /// Create a publisher holding `initial`.
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender,
            version: AtomicU64::new(0),
        }
    }

    /// Replace the current snapshot.
    ///
    /// Returns the new version number.
    pub fn publish(&self, state: Arc<AppState>) -> u64 {
        self.sender.send_replace(state);
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            version,
            receivers = self.sender.receiver_count(),
            "State published"
        );
        version
    }

    /// Current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<AppState> {
        Arc::clone(&self.sender.borrow())
    }

    /// New subscription starting at the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> StateSubscription {
        StateSubscription::new(self.sender.subscribe())
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Snapshots published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
