//! # State Subscriber
//!
//! Read-only access to the materialized state for the UI layer.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use shared_types::AppState;
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The store was dropped.
    #[error("State publisher closed")]
    Closed,
}

/// A handle on the current state.
///
/// Cloning yields an independent subscription at the same snapshot.
#[derive(Clone)]
pub struct StateSubscription {
    receiver: watch::Receiver<Arc<AppState>>,
}

impl StateSubscription {
    pub(crate) fn new(receiver: watch::Receiver<Arc<AppState>>) -> Self {
        Self { receiver }
    }

    /// Latest snapshot. Never blocks.
    #[must_use]
    pub fn current(&self) -> Arc<AppState> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait for the next snapshot and return it.
    pub async fn changed(&mut self) -> Result<Arc<AppState>, SubscriptionError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| SubscriptionError::Closed)?;
        Ok(Arc::clone(&self.receiver.borrow_and_update()))
    }

    /// Wait until `predicate` holds for the current snapshot.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Result<Arc<AppState>, SubscriptionError>
    where
        F: FnMut(&AppState) -> bool,
    {
        let state = self
            .receiver
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| SubscriptionError::Closed)?;
        Ok(Arc::clone(&state))
    }

    /// Convert into a `Stream` yielding the current snapshot first.
    #[must_use]
    pub fn into_stream(self) -> StateStream {
        StateStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// A stream of state snapshots.
pub struct StateStream {
    inner: WatchStream<Arc<AppState>>,
}

impl Stream for StateStream {
    type Item = Arc<AppState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
