//! # Materialized Store
//!
//! Single owner of the committees state. Events are folded one at a time
//! by the only pipeline consumer; readers get `Arc` snapshots through the
//! state publisher and never see a partially applied event.

use std::sync::Arc;

use ca_01_contract_reader::ContractCaller;
use ca_03_subscription_sync::BackoffPolicy;
use ca_04_state_projector::{ProjectionError, StateProjector};
use committee_telemetry::{
    CACHED_HEIGHT, COMMITTEES, DEAD_LETTERS, EVENTS_FOLDED, FOLD_FAILURES, SNAPSHOT_FAILURES,
};
use parking_lot::Mutex;
use shared_bus::{
    AdminEvent, DeadLetter, NormalizedEvent, PipelineReceiver, StatePublisher, StateSubscription,
};
use shared_types::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::domain::{restore, DeadLetterLog, Restored};
use crate::ports::{EffectHandler, SnapshotPersistence};

/// Read-only view of the store for other tasks.
#[derive(Clone)]
pub struct StoreHandle {
    publisher: Arc<StatePublisher>,
    dead_letters: Arc<Mutex<DeadLetterLog>>,
}

impl StoreHandle {
    /// Latest state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.publisher.current()
    }

    /// Stream of states, starting at the current one.
    #[must_use]
    pub fn subscribe(&self) -> StateSubscription {
        self.publisher.subscribe()
    }

    /// Retained dead letters, oldest first.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().snapshot()
    }
}

/// Load and restore the persisted snapshot.
///
/// A missing or unreadable snapshot starts from an empty state.
pub fn load_snapshot<P: SnapshotPersistence + ?Sized>(persistence: &P) -> Restored {
    match persistence.load() {
        Ok(Some(snapshot)) => {
            let restored = restore(snapshot);
            info!(
                committees = restored.state.committees.len(),
                subscriptions = restored.subscriptions.len(),
                "Snapshot restored"
            );
            restored
        }
        Ok(None) => {
            info!("No snapshot found, starting from genesis");
            restore(AppState::default())
        }
        Err(e) => {
            warn!("Snapshot unreadable, starting from genesis: {}", e);
            restore(AppState::default())
        }
    }
}

/// The materialized store.
pub struct MaterializedStore<C, P>
where
    C: ContractCaller + ?Sized,
    P: SnapshotPersistence + ?Sized,
{
    projector: StateProjector<C>,
    persistence: Arc<P>,
    config: StoreConfig,
    state: Arc<AppState>,
    publisher: Arc<StatePublisher>,
    dead_letters: Arc<Mutex<DeadLetterLog>>,
}

impl<C, P> MaterializedStore<C, P>
where
    C: ContractCaller + ?Sized,
    P: SnapshotPersistence + ?Sized,
{
    pub fn new(
        projector: StateProjector<C>,
        persistence: Arc<P>,
        initial: AppState,
        config: StoreConfig,
    ) -> Self {
        COMMITTEES.set(initial.committees.len() as i64);
        let state = Arc::new(initial);
        let publisher = StatePublisher::default();
        publisher.publish(Arc::clone(&state));
        Self {
            projector,
            persistence,
            dead_letters: Arc::new(Mutex::new(DeadLetterLog::new(config.dead_letter_capacity))),
            config,
            state,
            publisher: Arc::new(publisher),
        }
    }

    #[must_use]
    pub fn handle(&self) -> StoreHandle {
        StoreHandle {
            publisher: Arc::clone(&self.publisher),
            dead_letters: Arc::clone(&self.dead_letters),
        }
    }

    /// Latest state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    #[must_use]
    pub fn subscribe(&self) -> StateSubscription {
        self.publisher.subscribe()
    }

    /// Fold one event.
    ///
    /// Returns whether the state changed. An event whose reads failed is
    /// kept as a dead letter.
    pub async fn on_event<E>(&mut self, event: &NormalizedEvent, effects: &E) -> bool
    where
        E: EffectHandler + ?Sized,
    {
        match self.fold(event, effects).await {
            Ok(changed) => changed,
            Err(failure) => {
                self.dead_letter(event, &failure);
                false
            }
        }
    }

    /// Fold the rescans produced by a restore.
    ///
    /// Restored committees have no members until their rescan succeeds and
    /// history below the cached heights is not replayed, so a failed rescan
    /// is retried on `backoff` before it becomes a dead letter.
    pub async fn fold_rescans<E>(
        &mut self,
        rescans: &[NormalizedEvent],
        effects: &E,
        backoff: &BackoffPolicy,
    ) where
        E: EffectHandler + ?Sized,
    {
        for event in rescans {
            let mut retry = 0;
            loop {
                match self.fold(event, effects).await {
                    Ok(_) => break,
                    Err(failure) if retry < backoff.max_retries => {
                        let delay = backoff.delay(retry);
                        warn!(
                            committee = %format!("{:#x}", event.contract_address),
                            attempt = retry + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Member rescan failed, retrying: {}",
                            failure
                        );
                        retry += 1;
                        tokio::time::sleep(delay).await;
                    }
                    Err(failure) => {
                        self.dead_letter(event, &failure);
                        break;
                    }
                }
            }
        }
    }

    async fn fold<E>(&mut self, event: &NormalizedEvent, effects: &E) -> Result<bool, ProjectionError>
    where
        E: EffectHandler + ?Sized,
    {
        let reduction = self.projector.reduce(Arc::clone(&self.state), event).await;
        EVENTS_FOLDED.with_label_values(&[metric_label(&event.event)]).inc();

        if let Some(failure) = reduction.failure {
            return Err(failure);
        }
        if !reduction.changed {
            return Ok(false);
        }

        self.state = reduction.state;
        let version = self.publisher.publish(Arc::clone(&self.state));
        COMMITTEES.set(self.state.committees.len() as i64);
        if let AdminEvent::SubscriptionCached { .. } = event.event {
            if let Some(record) = self.state.subscription(&event.contract_address) {
                let address = format!("{:#x}", event.contract_address);
                CACHED_HEIGHT
                    .with_label_values(&[address.as_str()])
                    .set(record.block_number as i64);
            }
        }
        debug!(event = event.name(), block_number = event.block_number, version, "State updated");

        if self.should_persist(event) {
            self.persist();
        }

        for effect in &reduction.effects {
            effects.handle(effect, &self.state);
        }
        Ok(true)
    }

    fn dead_letter(&self, event: &NormalizedEvent, failure: &ProjectionError) {
        FOLD_FAILURES.with_label_values(&[metric_label(&event.event)]).inc();
        let mut dead_letters = self.dead_letters.lock();
        dead_letters.push(DeadLetter {
            event: event.clone(),
            reason: failure.to_string(),
        });
        DEAD_LETTERS.set(dead_letters.len() as i64);
    }

    /// Consume the pipeline until it closes or `cancel` fires.
    pub async fn run<E>(
        &mut self,
        receiver: &mut PipelineReceiver,
        effects: &E,
        cancel: &CancellationToken,
    ) where
        E: EffectHandler + ?Sized,
    {
        info!("Materialized store running");
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Materialized store cancelled");
                    break;
                }
                event = receiver.recv() => event,
            };

            match event {
                Some(event) => {
                    self.on_event(&event, effects).await;
                }
                None => {
                    info!("Event pipeline closed");
                    break;
                }
            }
        }
        self.persist();
    }

    /// Changes during a catch-up are saved with the next marker.
    fn should_persist(&self, event: &NormalizedEvent) -> bool {
        self.config.persist_during_catch_up || event.event.is_marker() || !self.state.is_syncing
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.state) {
            SNAPSHOT_FAILURES.inc();
            warn!("Snapshot save failed: {}", e);
        }
    }
}

fn metric_label(event: &AdminEvent) -> &str {
    match event {
        AdminEvent::Unknown { .. } => "Unknown",
        known => known.name(),
    }
}
