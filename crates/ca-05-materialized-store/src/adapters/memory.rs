//! # In-Memory Snapshot Store

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use shared_types::AppState;

use crate::domain::StoreError;
use crate::ports::SnapshotPersistence;

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: RwLock<Option<AppState>>,
    saves: AtomicUsize,
    should_fail: AtomicBool,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    #[must_use]
    pub fn with_snapshot(state: AppState) -> Self {
        let store = Self::default();
        *store.snapshot.write() = Some(state);
        store
    }

    /// Make every call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The saved snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<AppState> {
        self.snapshot.read().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl SnapshotPersistence for MemorySnapshotStore {
    fn load(&self) -> Result<Option<AppState>, StoreError> {
        self.check()?;
        Ok(self.snapshot())
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        self.check()?;
        *self.snapshot.write() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
