//! # State Projector
//!
//! Folds one `NormalizedEvent` into the committees state.
//!
//! Every transition runs in two steps. `prepare` performs the contract
//! reads the event needs against the current state and produces a
//! `Transition`; `apply` then mutates a copy of the state without any
//! further I/O. A failed read therefore never leaves a half-applied event
//! behind.

use std::sync::Arc;

use ca_01_contract_reader::{
    CommitteeContracts, ContractCaller, ContractReadError, ContractReader,
};
use shared_bus::{AdminEvent, NormalizedEvent};
use shared_types::{
    Address, AppState, Committee, Member, Permission, PermissionKey, SubscriptionCacheRecord,
    SubscriptionPhase, U256,
};
use tracing::{debug, info, warn};

use crate::config::ProjectorConfig;
use crate::domain::{Effect, ProjectionError, Reduction};

/// A state change with every input already read.
#[derive(Debug)]
enum Transition {
    Noop,
    AddCommittee(Box<Committee>),
    UpdateInfo {
        address: Address,
        name: String,
        description: String,
    },
    RemoveCommittee {
        address: Address,
        token: Address,
    },
    SetMembers {
        address: Address,
        members: Vec<Member>,
    },
    SetPermission {
        key: PermissionKey,
        value: Option<Permission>,
    },
    GlobalSync(bool),
    Subscription {
        address: Address,
        record: SubscriptionCacheRecord,
    },
}

/// The state projector.
pub struct StateProjector<C: ContractCaller + ?Sized> {
    reader: ContractReader<C>,
    config: ProjectorConfig,
}

impl<C: ContractCaller + ?Sized> StateProjector<C> {
    pub fn new(caller: Arc<C>, config: ProjectorConfig) -> Self {
        Self {
            reader: ContractReader::with_concurrency(caller, config.read_concurrency),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Fold `event` into `state`.
    ///
    /// Never fails: when a read fails the input state is returned as is and
    /// the error is reported in `Reduction::failure`.
    pub async fn reduce(&self, state: Arc<AppState>, event: &NormalizedEvent) -> Reduction {
        let transition = match self.prepare(&state, event).await {
            Ok(transition) => transition,
            Err(source) => {
                let failure = ProjectionError::Read {
                    event: event.name().to_string(),
                    source,
                };
                warn!(
                    event = event.name(),
                    address = %format!("{:#x}", event.contract_address),
                    block_number = event.block_number,
                    "Event skipped: {}",
                    failure
                );
                return Reduction::failed(state, failure);
            }
        };

        if matches!(transition, Transition::Noop) {
            return Reduction::unchanged(state);
        }

        let mut next = state;
        let effects = apply(Arc::make_mut(&mut next), transition);
        Reduction {
            state: next,
            effects,
            changed: true,
            failure: None,
        }
    }

    async fn prepare(
        &self,
        state: &AppState,
        event: &NormalizedEvent,
    ) -> Result<Transition, ContractReadError> {
        match &event.event {
            AdminEvent::CreateCommittee {
                committee_address,
                voting_address,
                finance_address,
                name,
                description,
            } => {
                if state.committee(committee_address).is_some() {
                    debug!(address = %format!("{committee_address:#x}"), "Committee already known");
                    return Ok(Transition::Noop);
                }
                let contracts = self
                    .reader
                    .committee_contracts(*committee_address, *voting_address, *finance_address)
                    .await?;
                Ok(Transition::AddCommittee(Box::new(new_committee(
                    *committee_address,
                    *voting_address,
                    name,
                    description,
                    contracts,
                ))))
            }

            AdminEvent::ModifyCommitteeInfo {
                committee_address,
                name,
                description,
            } => Ok(match state.committee(committee_address) {
                Some(c) if c.name != *name || c.description != *description => {
                    Transition::UpdateInfo {
                        address: *committee_address,
                        name: name.clone(),
                        description: description.clone(),
                    }
                }
                _ => Transition::Noop,
            }),

            AdminEvent::RemoveCommittee { committee_address } => {
                Ok(match state.committee(committee_address) {
                    Some(c) => Transition::RemoveCommittee {
                        address: c.address,
                        token: c.token_address,
                    },
                    None => Transition::Noop,
                })
            }

            AdminEvent::Transfer { to, .. } => {
                let Some(committee) = state.committee_by_token(&event.contract_address) else {
                    return Ok(Transition::Noop);
                };
                let mut candidates = committee.member_addresses();
                candidates.push(*to);
                self.rescan(committee, candidates).await
            }

            AdminEvent::RescanMembers {
                committee_address,
                candidates,
            } => match state.committee(committee_address) {
                Some(committee) => self.rescan(committee, candidates.clone()).await,
                None => Ok(Transition::Noop),
            },

            AdminEvent::SetPermission {
                entity,
                app,
                role,
                allowed,
            } => {
                if let Some(acl) = self.config.acl_address {
                    if acl != event.contract_address {
                        debug!(
                            address = %format!("{:#x}", event.contract_address),
                            "SetPermission from a contract other than the ACL ignored"
                        );
                        return Ok(Transition::Noop);
                    }
                }
                let key = PermissionKey::new(entity, app, role);
                let value = (*allowed).then(|| Permission {
                    entity: *entity,
                    app: *app,
                    role: *role,
                });
                Ok(if state.permissions.get(&key) == Some(&value) {
                    Transition::Noop
                } else {
                    Transition::SetPermission { key, value }
                })
            }

            AdminEvent::SyncStatusSyncing => Ok(global_sync(state, true)),
            AdminEvent::SyncStatusSynced => Ok(global_sync(state, false)),

            AdminEvent::SubscriptionSyncing
            | AdminEvent::SubscriptionCached { .. }
            | AdminEvent::SubscriptionSynced { .. } => {
                let address = event.contract_address;
                let current = state.subscription(&address).copied();
                let record = advance(current.unwrap_or_default(), &event.event);
                Ok(if current == Some(record) {
                    Transition::Noop
                } else {
                    Transition::Subscription { address, record }
                })
            }

            AdminEvent::Unknown { name } => {
                debug!(event = %name, "Unknown event ignored");
                Ok(Transition::Noop)
            }
        }
    }

    /// Re-read the balance of every candidate and rebuild the member list.
    async fn rescan(
        &self,
        committee: &Committee,
        candidates: Vec<Address>,
    ) -> Result<Transition, ContractReadError> {
        let candidates = dedup_candidates(candidates);
        let balances = self
            .reader
            .balances_of(committee.token_address, &candidates)
            .await?;

        let unique = committee.token_params.unique;
        let members: Vec<Member> = balances
            .into_iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(holder, balance)| Member(holder, if unique { U256::one() } else { balance }))
            .collect();

        Ok(if members == committee.members {
            Transition::Noop
        } else {
            Transition::SetMembers {
                address: committee.address,
                members,
            }
        })
    }
}

fn new_committee(
    address: Address,
    voting_address: Address,
    name: &str,
    description: &str,
    contracts: CommitteeContracts,
) -> Committee {
    Committee {
        address,
        name: name.to_string(),
        description: description.to_string(),
        token_address: contracts.token_address,
        voting_address,
        finance_address: contracts.finance_address,
        vault_address: contracts.vault_address,
        token_params: contracts.token_params,
        voting_params: contracts.voting_params,
        token_symbol: contracts.token.symbol,
        token_decimals: contracts.token.decimals,
        members: Vec::new(),
    }
}

/// Zero address removed; first occurrence kept.
fn dedup_candidates(candidates: Vec<Address>) -> Vec<Address> {
    let mut unique = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_zero() && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

fn global_sync(state: &AppState, syncing: bool) -> Transition {
    if state.is_syncing == syncing {
        Transition::Noop
    } else {
        Transition::GlobalSync(syncing)
    }
}

/// Next record for a subscription marker.
///
/// `SYNCING` opens a new catch-up run. Within a run the phase only moves
/// forward, and the cached height never decreases.
fn advance(record: SubscriptionCacheRecord, marker: &AdminEvent) -> SubscriptionCacheRecord {
    match marker {
        AdminEvent::SubscriptionSyncing => SubscriptionCacheRecord {
            is_syncing: true,
            phase: SubscriptionPhase::Syncing,
            ..record
        },
        AdminEvent::SubscriptionCached { block_number } => SubscriptionCacheRecord {
            block_number: record.block_number.max(*block_number),
            phase: record.phase.max(SubscriptionPhase::Cached),
            ..record
        },
        AdminEvent::SubscriptionSynced { .. } => SubscriptionCacheRecord {
            is_syncing: false,
            phase: SubscriptionPhase::Synced,
            ..record
        },
        _ => record,
    }
}

fn apply(state: &mut AppState, transition: Transition) -> Vec<Effect> {
    match transition {
        Transition::Noop => Vec::new(),

        Transition::AddCommittee(committee) => {
            info!(
                address = %format!("{:#x}", committee.address),
                token = %format!("{:#x}", committee.token_address),
                name = %committee.name,
                "Committee created"
            );
            let token = committee.token_address;
            state.committees.push(*committee);
            vec![Effect::WatchContract { address: token }]
        }

        Transition::UpdateInfo {
            address,
            name,
            description,
        } => {
            if let Some(committee) = state.committees.iter_mut().find(|c| c.address == address) {
                committee.name = name;
                committee.description = description;
            }
            Vec::new()
        }

        Transition::RemoveCommittee { address, token } => {
            info!(address = %format!("{address:#x}"), "Committee removed");
            state.committees.retain(|c| c.address != address);
            state.cached_subscriptions.remove(&token);
            vec![Effect::UnwatchContract { address: token }]
        }

        Transition::SetMembers { address, members } => {
            if let Some(committee) = state.committees.iter_mut().find(|c| c.address == address) {
                debug!(
                    address = %format!("{address:#x}"),
                    members = members.len(),
                    "Members updated"
                );
                committee.members = members;
            }
            Vec::new()
        }

        Transition::SetPermission { key, value } => {
            debug!(key = %key, granted = value.is_some(), "Permission updated");
            state.permissions.insert(key, value);
            Vec::new()
        }

        Transition::GlobalSync(syncing) => {
            state.is_syncing = syncing;
            Vec::new()
        }

        Transition::Subscription { address, record } => {
            state.cached_subscriptions.insert(address, record);
            Vec::new()
        }
    }
}
