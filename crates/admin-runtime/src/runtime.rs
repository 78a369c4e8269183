//! # Admin Runtime
//!
//! ## Startup Sequence
//!
//! 1. Lock the data directory and load the snapshot
//! 2. Resolve the ACL from the kernel (bounded retries, fatal on exhaustion)
//! 3. Load role names (optional)
//! 4. Build the pipeline, synchronizers, projector and store
//! 5. Fold the restore rescans
//! 6. Watch the committees app, the ACL and every committee token
//! 7. Start the store task and the status reporter

use std::sync::Arc;

use anyhow::{Context, Result};
use ca_01_contract_reader::{ContractReader, RoleRegistry};
use ca_02_event_normalizer::EventNormalizer;
use ca_03_subscription_sync::{retry_with_backoff, SubscriptionManager, SubscriptionSynchronizer};
use ca_04_state_projector::{ProjectorConfig, StateProjector};
use ca_05_materialized_store::{load_snapshot, FileSnapshotStore, MaterializedStore, StoreHandle};
use shared_bus::event_pipeline;
use shared_types::{address_hex, Address};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::{FileAppRegistry, JsonRpcClient, RpcContractCaller, RpcLogSource};
use crate::config::RuntimeConfig;
use crate::report::{committee_lines, permission_lines};

/// The running engine.
pub struct AdminRuntime {
    root: CancellationToken,
    manager: SubscriptionManager<RpcLogSource>,
    store: StoreHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl AdminRuntime {
    /// Start the engine.
    ///
    /// # Errors
    ///
    /// Fails if the data directory is locked, the RPC client cannot be
    /// built, or the ACL cannot be resolved within the bootstrap retries.
    pub async fn start(config: RuntimeConfig) -> Result<Self> {
        info!("===========================================");
        info!("  Committee Admin v{}", crate::VERSION);
        info!("===========================================");

        // Step 1: Snapshot
        let persistence = Arc::new(
            FileSnapshotStore::open(&config.data_dir).with_context(|| {
                format!("Failed to open data directory {}", config.data_dir.display())
            })?,
        );
        let restored = load_snapshot(persistence.as_ref());

        // Step 2: ACL
        let client = Arc::new(
            JsonRpcClient::new(config.rpc_url.clone(), config.request_timeout)
                .context("Failed to create RPC client")?,
        );
        let caller = Arc::new(RpcContractCaller::new(Arc::clone(&client)));
        let reader = ContractReader::new(Arc::clone(&caller));
        let kernel = config.kernel_address;
        let bootstrap_reader = &reader;
        let acl = retry_with_backoff(&config.bootstrap_backoff, "kernel.acl", move || {
            bootstrap_reader.kernel_acl(kernel)
        })
        .await
        .context("Permission registry unreachable")?;
        info!(acl = %address_hex(&acl), "ACL resolved");

        // Step 3: Roles
        let roles = match &config.apps_file {
            Some(path) => match RoleRegistry::load(&FileAppRegistry::new(path.clone())).await {
                Ok(roles) => roles,
                Err(e) => {
                    warn!("Role names unavailable: {}", e);
                    RoleRegistry::new(Vec::new())
                }
            },
            None => RoleRegistry::new(Vec::new()),
        };
        debug!(roles = roles.len(), "Role registry loaded");

        // Step 4: Components
        let root = CancellationToken::new();
        let (sender, mut receiver) = event_pipeline(config.pipeline_capacity);
        let source = Arc::new(RpcLogSource::new(Arc::clone(&client), config.poll_interval));
        let synchronizer = SubscriptionSynchronizer::new(
            source,
            Arc::new(EventNormalizer::new()),
            sender,
            config.sync.clone(),
        );
        let manager = SubscriptionManager::new(synchronizer, root.clone());

        let projector = StateProjector::new(
            caller,
            ProjectorConfig {
                acl_address: Some(acl),
                read_concurrency: config.read_concurrency,
            },
        );
        let mut store = MaterializedStore::new(
            projector,
            persistence,
            restored.state,
            config.store.clone(),
        );
        let handle = store.handle();

        // Step 5: Rescans
        store
            .fold_rescans(&restored.rescans, &manager, &config.bootstrap_backoff)
            .await;

        // Step 6: Watches
        let state = store.state();
        let mut watched: Vec<Address> = vec![config.committees_app, acl];
        watched.extend(state.committees.iter().map(|c| c.token_address));
        for address in watched {
            let cached = state.subscription(&address).map(|r| r.block_number);
            manager.watch(address, cached);
        }

        // Step 7: Tasks
        let store_manager = manager.clone();
        let store_cancel = root.child_token();
        let store_task = tokio::spawn(async move {
            store.run(&mut receiver, &store_manager, &store_cancel).await;
        });
        let reporter = tokio::spawn(report_when_synced(handle.clone(), roles, root.child_token()));

        info!(
            rpc_url = %client.url(),
            data_dir = %config.data_dir.display(),
            "Committee admin running"
        );
        Ok(Self {
            root,
            manager,
            store: handle,
            tasks: vec![store_task, reporter],
        })
    }

    /// Read-only access to the state.
    #[must_use]
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Stop every task and flush the snapshot.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        self.root.cancel();
        self.manager.shutdown().await;
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Shutdown complete");
    }
}

/// Log a state summary each time a catch-up finishes.
async fn report_when_synced(store: StoreHandle, roles: RoleRegistry, cancel: CancellationToken) {
    let mut subscription = store.subscribe();
    let mut was_syncing = subscription.current().is_syncing;
    loop {
        let state = tokio::select! {
            _ = cancel.cancelled() => return,
            state = subscription.changed() => match state {
                Ok(state) => state,
                Err(_) => return,
            },
        };

        if was_syncing && !state.is_syncing {
            info!(committees = state.committees.len(), "Committees synced");
            for line in committee_lines(&state) {
                info!("  {}", line);
            }
            for committee in &state.committees {
                for line in permission_lines(&state, committee, &roles) {
                    debug!(committee = %committee.name, "  {}", line);
                }
            }
            let dead_letters = store.dead_letters();
            if !dead_letters.is_empty() {
                warn!(count = dead_letters.len(), "Events skipped after failed reads");
            }
        }
        was_syncing = state.is_syncing;
    }
}
