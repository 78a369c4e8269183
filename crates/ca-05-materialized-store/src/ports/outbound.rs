//! # Outbound Ports
//!
//! Where snapshots are kept and how projector effects are carried out.

use parking_lot::Mutex;
use shared_types::AppState;

use ca_04_state_projector::Effect;

use crate::domain::StoreError;

/// Snapshot persistence - outbound port.
pub trait SnapshotPersistence: Send + Sync {
    /// The last saved snapshot, `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<AppState>, StoreError>;

    /// Replace the saved snapshot.
    fn save(&self, state: &AppState) -> Result<(), StoreError>;
}

/// Executes projector effects - outbound port.
pub trait EffectHandler: Send + Sync {
    /// Run `effect`. `state` is the state the effect was produced with.
    fn handle(&self, effect: &Effect, state: &AppState);
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Records effects instead of running them.
#[derive(Debug, Default)]
pub struct RecordingEffectHandler {
    effects: Mutex<Vec<Effect>>,
}

impl RecordingEffectHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects handled so far, in order.
    #[must_use]
    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().clone()
    }
}

impl EffectHandler for RecordingEffectHandler {
    fn handle(&self, effect: &Effect, _state: &AppState) {
        self.effects.lock().push(effect.clone());
    }
}
