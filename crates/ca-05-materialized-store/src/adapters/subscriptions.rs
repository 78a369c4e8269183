//! # Subscription Effects
//!
//! Watch and unwatch requests from the projector start and stop
//! synchronizers.

use ca_03_subscription_sync::{ChainLogSource, SubscriptionManager};
use ca_04_state_projector::Effect;
use shared_types::AppState;

use crate::ports::EffectHandler;

impl<S: ChainLogSource + ?Sized + 'static> EffectHandler for SubscriptionManager<S> {
    fn handle(&self, effect: &Effect, state: &AppState) {
        match effect {
            Effect::WatchContract { address } => {
                let cached = state.subscription(address).map(|r| r.block_number);
                self.watch(*address, cached);
            }
            Effect::UnwatchContract { address } => {
                self.unwatch(address);
            }
        }
    }
}
