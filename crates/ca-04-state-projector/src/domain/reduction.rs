//! # Reduction Results

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{Address, AppState};

use super::errors::ProjectionError;

/// Follow-up work requested by a transition, executed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Start synchronizing the contract (a new committee token).
    WatchContract { address: Address },
    /// Stop synchronizing the contract (a removed committee token).
    UnwatchContract { address: Address },
}

/// Outcome of folding one event.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub state: Arc<AppState>,
    pub effects: Vec<Effect>,
    /// Whether `state` differs from the input.
    pub changed: bool,
    /// Set when the event was skipped because a read failed.
    pub failure: Option<ProjectionError>,
}

impl Reduction {
    /// The input state, untouched.
    #[must_use]
    pub fn unchanged(state: Arc<AppState>) -> Self {
        Self {
            state,
            effects: Vec::new(),
            changed: false,
            failure: None,
        }
    }

    /// The input state, untouched, with the read failure that caused it.
    #[must_use]
    pub fn failed(state: Arc<AppState>, failure: ProjectionError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::unchanged(state)
        }
    }
}
