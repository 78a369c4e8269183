//! # Test Fixtures
//!
//! One organization with a committees app, an ACL and committees whose
//! contracts answer through `MockContractCaller`. Logs are ABI-encoded
//! exactly as a node returns them so they go through the normalizer.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ca_01_contract_reader::MockContractCaller;
use ca_02_event_normalizer::domain::{
    CREATE_COMMITTEE, MODIFY_COMMITTEE_INFO, REMOVE_COMMITTEE, SET_PERMISSION, TRANSFER,
};
use ca_02_event_normalizer::EventNormalizer;
use ca_03_subscription_sync::{
    BackoffPolicy, MockChainLogSource, SubscriptionManager, SubscriptionSynchronizer, SyncConfig,
};
use ca_04_state_projector::{ProjectorConfig, StateProjector};
use ca_05_materialized_store::{
    load_snapshot, FileSnapshotStore, MaterializedStore, StoreConfig, StoreError, StoreHandle,
};
use shared_bus::{event_pipeline, AdminEvent, NormalizedEvent, SubscriptionError};
use shared_types::abi::{encode, utf8_to_bytes32};
use shared_types::{
    AbiValue, Address, AppState, BlockNumber, Hash, LogEntry, Role, SubscriptionPhase, U256,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 1% in the voting app's fixed-point representation.
const PCT: u64 = 10_000_000_000_000_000;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn committees_app() -> Address {
    addr(0xC0)
}

pub fn acl() -> Address {
    addr(0xAC)
}

pub fn member(n: u64) -> Address {
    addr(0x1000 + n)
}

/// Contracts backing one committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitteeFixture {
    pub address: Address,
    pub token: Address,
    pub voting: Address,
    pub unique: bool,
}

impl CommitteeFixture {
    /// Committee `n` lives at `0xn`, its token at `0x10n`, its voting at `0x20n`.
    pub fn new(n: u64, unique: bool) -> Self {
        Self {
            address: addr(n),
            token: addr(0x100 + n),
            voting: addr(0x200 + n),
            unique,
        }
    }

    /// Answer every read the projector makes when the committee is created.
    pub fn install(&self, mock: &MockContractCaller) {
        let max = if self.unique { U256::one() } else { U256::zero() };
        mock.set(self.address, "token", vec![], AbiValue::Address(self.token));
        mock.set(self.address, "maxAccountTokens", vec![], AbiValue::Uint(max));
        mock.set(self.token, "symbol", vec![], AbiValue::String("CT".into()));
        mock.set(self.token, "decimals", vec![], AbiValue::Uint(U256::zero()));
        mock.set(self.token, "transfersEnabled", vec![], AbiValue::Bool(!self.unique));
        mock.set(self.voting, "supportRequiredPct", vec![], AbiValue::Uint(U256::from(50 * PCT)));
        mock.set(self.voting, "minAcceptQuorumPct", vec![], AbiValue::Uint(U256::from(15 * PCT)));
        mock.set(self.voting, "voteTime", vec![], AbiValue::Uint(U256::from(86_400)));
    }

    pub fn create_event(&self, block: BlockNumber, index: u64) -> NormalizedEvent {
        event(
            AdminEvent::CreateCommittee {
                committee_address: self.address,
                voting_address: self.voting,
                finance_address: None,
                name: format!("Committee {:x}", self.address.to_low_u64_be()),
                description: String::new(),
            },
            committees_app(),
            block,
            index,
        )
    }

    pub fn transfer_event(&self, from: Address, to: Address, block: BlockNumber, index: u64) -> NormalizedEvent {
        event(
            AdminEvent::Transfer {
                from,
                to,
                amount: U256::one(),
            },
            self.token,
            block,
            index,
        )
    }

    pub fn remove_event(&self, block: BlockNumber, index: u64) -> NormalizedEvent {
        event(
            AdminEvent::RemoveCommittee {
                committee_address: self.address,
            },
            committees_app(),
            block,
            index,
        )
    }

    pub fn modify_event(&self, name: &str, block: BlockNumber, index: u64) -> NormalizedEvent {
        event(
            AdminEvent::ModifyCommitteeInfo {
                committee_address: self.address,
                name: name.to_string(),
                description: String::new(),
            },
            committees_app(),
            block,
            index,
        )
    }

    pub fn create_log(&self, block: BlockNumber, index: u64) -> LogEntry {
        let data = encode(&[
            AbiValue::Address(self.address),
            AbiValue::Address(self.voting),
            AbiValue::Address(Address::zero()),
            AbiValue::Bytes32(utf8_to_bytes32("Finance")),
            AbiValue::String("Handles the budget".into()),
        ]);
        log(committees_app(), vec![CREATE_COMMITTEE.topic()], data, block, index)
    }

    pub fn modify_log(&self, name: &str, block: BlockNumber, index: u64) -> LogEntry {
        let data = encode(&[
            AbiValue::Address(self.address),
            AbiValue::Bytes32(utf8_to_bytes32(name)),
            AbiValue::String(String::new()),
        ]);
        log(committees_app(), vec![MODIFY_COMMITTEE_INFO.topic()], data, block, index)
    }

    pub fn remove_log(&self, block: BlockNumber, index: u64) -> LogEntry {
        let data = encode(&[AbiValue::Address(self.address)]);
        log(committees_app(), vec![REMOVE_COMMITTEE.topic()], data, block, index)
    }

    /// A one-token transfer emitted by the committee token.
    pub fn transfer_log(&self, from: Address, to: Address, block: BlockNumber, index: u64) -> LogEntry {
        let data = encode(&[AbiValue::Uint(U256::one())]);
        log(
            self.token,
            vec![TRANSFER.topic(), topic_of(from), topic_of(to)],
            data,
            block,
            index,
        )
    }
}

/// A `SetPermission` log emitted by the ACL.
pub fn set_permission_log(
    entity: Address,
    app: Address,
    role: Role,
    allowed: bool,
    block: BlockNumber,
    index: u64,
) -> LogEntry {
    log(
        acl(),
        vec![SET_PERMISSION.topic(), topic_of(entity), topic_of(app), role],
        encode(&[AbiValue::Bool(allowed)]),
        block,
        index,
    )
}

pub fn event(event: AdminEvent, contract: Address, block: BlockNumber, index: u64) -> NormalizedEvent {
    NormalizedEvent {
        event,
        contract_address: contract,
        block_number: block,
        log_index: index,
    }
}

/// Mock caller answering for `committees`.
pub fn contracts(committees: &[CommitteeFixture]) -> Arc<MockContractCaller> {
    let mock = Arc::new(MockContractCaller::new());
    for committee in committees {
        committee.install(&mock);
    }
    mock
}

/// Sync settings with millisecond retries.
pub fn sync_config(reorg_safety_margin: u64) -> SyncConfig {
    SyncConfig {
        reorg_safety_margin,
        genesis_block: 0,
        log_batch_size: 1_000,
        backoff: BackoffPolicy {
            initial_delay: Duration::from_millis(1),
            factor: 2,
            max_retries: 3,
            max_delay: Duration::from_millis(4),
        },
    }
}

fn topic_of(address: Address) -> Hash {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    Hash::from(word)
}

fn log(address: Address, topics: Vec<Hash>, data: Vec<u8>, block: BlockNumber, index: u64) -> LogEntry {
    LogEntry {
        address,
        topics,
        data,
        block_number: Some(block),
        log_index: Some(index),
        transaction_hash: None,
        removed: false,
    }
}

// =============================================================================
// Engine Session
// =============================================================================

/// The full engine over a mock chain, started the way the daemon starts it.
pub struct Session {
    root: CancellationToken,
    manager: SubscriptionManager<MockChainLogSource>,
    store: StoreHandle,
    task: JoinHandle<()>,
}

impl Session {
    /// Restore from `data_dir`, fold the rescans, then watch the committees
    /// app, the ACL and every known token.
    pub async fn start(
        data_dir: &Path,
        source: Arc<MockChainLogSource>,
        caller: Arc<MockContractCaller>,
        reorg_safety_margin: u64,
    ) -> Result<Self, StoreError> {
        let persistence = Arc::new(FileSnapshotStore::open(data_dir)?);
        let restored = load_snapshot(persistence.as_ref());

        let root = CancellationToken::new();
        let (sender, mut receiver) = event_pipeline(256);
        let synchronizer = SubscriptionSynchronizer::new(
            source,
            Arc::new(EventNormalizer::new()),
            sender,
            sync_config(reorg_safety_margin),
        );
        let manager = SubscriptionManager::new(synchronizer, root.clone());
        let projector = StateProjector::new(
            caller,
            ProjectorConfig {
                acl_address: Some(acl()),
                ..Default::default()
            },
        );
        let mut store = MaterializedStore::new(projector, persistence, restored.state, StoreConfig::default());
        store
            .fold_rescans(&restored.rescans, &manager, &sync_config(reorg_safety_margin).backoff)
            .await;

        let state = store.state();
        let mut watched = vec![committees_app(), acl()];
        watched.extend(state.committees.iter().map(|c| c.token_address));
        for address in watched {
            manager.watch(address, state.subscription(&address).map(|r| r.block_number));
        }

        let handle = store.handle();
        let store_manager = manager.clone();
        let cancel = root.child_token();
        let task = tokio::spawn(async move {
            store.run(&mut receiver, &store_manager, &cancel).await;
        });

        Ok(Self {
            root,
            manager,
            store: handle,
            task,
        })
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn manager(&self) -> &SubscriptionManager<MockChainLogSource> {
        &self.manager
    }

    /// Wait until every address in `watched` finished catching up.
    pub async fn synced(&self, watched: &[Address]) -> Result<Arc<AppState>, SubscriptionError> {
        self.wait_for(|state| is_synced(state, watched)).await
    }

    /// Wait until `predicate` holds for the published state.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<Arc<AppState>, SubscriptionError>
    where
        F: FnMut(&AppState) -> bool,
    {
        let mut subscription = self.store.subscribe();
        tokio::time::timeout(Duration::from_secs(10), subscription.wait_for(predicate))
            .await
            .map_err(|_| SubscriptionError::Closed)?
    }

    /// Cancel everything and wait for the final snapshot to be written.
    pub async fn stop(self) {
        self.root.cancel();
        self.manager.shutdown().await;
        let _ = self.task.await;
    }
}

/// Global sync finished and every address in `watched` reached `Synced`.
pub fn is_synced(state: &AppState, watched: &[Address]) -> bool {
    !state.is_syncing
        && watched.iter().all(|address| {
            state
                .subscription(address)
                .map_or(false, |record| record.phase == SubscriptionPhase::Synced)
        })
}
