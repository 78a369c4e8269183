//! # Projection Properties
//!
//! Folding guarantees checked across the projector and the store:
//!
//! 1. **Idempotence**: a redelivered transfer leaves the state unchanged
//! 2. **Cross-contract order**: interleaving two committees' streams
//!    yields the same committees
//! 3. **Tombstones**: a revoked permission stays revoked through later events
//! 4. **Removal finality**: events after a removal never bring a committee back

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ca_01_contract_reader::MockContractCaller;
    use ca_04_state_projector::{Effect, ProjectorConfig, StateProjector};
    use ca_05_materialized_store::{MaterializedStore, MemorySnapshotStore, RecordingEffectHandler, StoreConfig};
    use proptest::prelude::*;
    use shared_bus::{AdminEvent, NormalizedEvent};
    use shared_types::{Address, AppState, Member, PermissionKey, Role, U256};

    use crate::fixtures::{acl, addr, contracts, event, member, CommitteeFixture};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn projector(mock: &Arc<MockContractCaller>) -> StateProjector<MockContractCaller> {
        StateProjector::new(
            Arc::clone(mock),
            ProjectorConfig {
                acl_address: Some(acl()),
                ..Default::default()
            },
        )
    }

    async fn fold(projector: &StateProjector<MockContractCaller>, events: &[NormalizedEvent]) -> Arc<AppState> {
        let mut state = Arc::new(AppState::default());
        for event in events {
            let reduction = projector.reduce(state, event).await;
            assert!(reduction.failure.is_none(), "{:?}", reduction.failure);
            state = reduction.state;
        }
        state
    }

    fn grant(role: u64, allowed: bool, block: u64) -> NormalizedEvent {
        event(
            AdminEvent::SetPermission {
                entity: addr(0xA),
                app: addr(0xF0),
                role: Role::from_low_u64_be(role),
                allowed,
            },
            acl(),
            block,
            0,
        )
    }

    fn key(role: u64) -> PermissionKey {
        PermissionKey::new(&addr(0xA), &addr(0xF0), &Role::from_low_u64_be(role))
    }

    // =============================================================================
    // IDEMPOTENCE
    // =============================================================================

    #[tokio::test]
    async fn test_redelivered_transfer_is_noop() {
        let committee = CommitteeFixture::new(0xA, true);
        let mock = contracts(&[committee]);
        mock.set_balance(committee.token, member(1), 1);
        let projector = projector(&mock);

        let transfer = committee.transfer_event(Address::zero(), member(1), 2, 0);
        let once = fold(&projector, &[committee.create_event(1, 0), transfer.clone()]).await;

        let again = projector.reduce(Arc::clone(&once), &transfer).await;
        assert!(!again.changed);
        assert!(again.effects.is_empty());
        assert_eq!(*again.state, *once);
    }

    #[tokio::test]
    async fn test_transferable_token_stake_follows_balance() {
        let committee = CommitteeFixture::new(0xA, false);
        let mock = contracts(&[committee]);
        mock.set_balance(committee.token, member(1), 5);
        let projector = projector(&mock);

        let transfer = committee.transfer_event(Address::zero(), member(1), 2, 0);
        let twice = fold(
            &projector,
            &[committee.create_event(1, 0), transfer.clone(), transfer],
        )
        .await;

        assert_eq!(
            twice.committees[0].members,
            vec![Member(member(1), U256::from(5))]
        );
    }

    // =============================================================================
    // CROSS-CONTRACT ORDER
    // =============================================================================

    fn stream(committee: &CommitteeFixture) -> Vec<NormalizedEvent> {
        vec![
            committee.create_event(1, 0),
            committee.transfer_event(Address::zero(), member(1), 2, 0),
            committee.transfer_event(Address::zero(), member(2), 3, 0),
            committee.transfer_event(member(1), member(3), 4, 0),
        ]
    }

    /// Merge `a` and `b` keeping each one's order; `picks[i]` selects the source.
    fn interleave(a: Vec<NormalizedEvent>, b: Vec<NormalizedEvent>, picks: &[bool]) -> Vec<NormalizedEvent> {
        let mut a = a.into_iter().peekable();
        let mut b = b.into_iter().peekable();
        let mut merged = Vec::new();
        for &take_a in picks {
            let next = match (take_a, a.peek().is_some()) {
                (true, true) | (false, false) => a.next().or_else(|| b.next()),
                _ => b.next().or_else(|| a.next()),
            };
            merged.extend(next);
        }
        merged.extend(a);
        merged.extend(b);
        merged
    }

    fn sorted(state: &AppState) -> AppState {
        let mut state = state.clone();
        state.committees.sort_by_key(|c| c.address);
        state
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_interleaving_committees_is_order_independent(
            picks in proptest::collection::vec(any::<bool>(), 8)
        ) {
            let a = CommitteeFixture::new(0xA, true);
            let b = CommitteeFixture::new(0xB, false);
            let mock = contracts(&[a, b]);
            for (holder, balance) in [(1, 1), (2, 2), (3, 0)] {
                mock.set_balance(a.token, member(holder), balance);
                mock.set_balance(b.token, member(holder), balance);
            }
            mock.set_balance(a.token, member(3), 1);
            let projector = projector(&mock);

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (sequential, interleaved) = runtime.block_on(async {
                let mut sequential = stream(&a);
                sequential.extend(stream(&b));
                (
                    fold(&projector, &sequential).await,
                    fold(&projector, &interleave(stream(&a), stream(&b), &picks)).await,
                )
            });

            prop_assert_eq!(sorted(&sequential), sorted(&interleaved));
        }
    }

    #[tokio::test]
    async fn test_interleaved_streams_members() {
        let a = CommitteeFixture::new(0xA, true);
        let b = CommitteeFixture::new(0xB, false);
        let mock = contracts(&[a, b]);
        for (holder, balance) in [(1, 0), (2, 2), (3, 4)] {
            mock.set_balance(b.token, member(holder), balance);
        }
        for (holder, balance) in [(1, 1), (2, 1), (3, 0)] {
            mock.set_balance(a.token, member(holder), balance);
        }
        let projector = projector(&mock);

        let state = fold(&projector, &interleave(stream(&a), stream(&b), &[false, true, false, true])).await;

        let state = sorted(&state);
        assert_eq!(
            state.committees[0].members,
            vec![Member(member(1), U256::one()), Member(member(2), U256::one())]
        );
        assert_eq!(
            state.committees[1].members,
            vec![Member(member(2), U256::from(2)), Member(member(3), U256::from(4))]
        );
    }

    // =============================================================================
    // TOMBSTONES
    // =============================================================================

    #[tokio::test]
    async fn test_revocation_survives_intervening_events() {
        let committee = CommitteeFixture::new(0xA, true);
        let mock = contracts(&[committee]);
        mock.set_balance(committee.token, member(1), 1);
        let projector = projector(&mock);

        let state = fold(
            &projector,
            &[
                committee.create_event(1, 0),
                grant(1, true, 2),
                committee.transfer_event(Address::zero(), member(1), 3, 0),
                grant(2, true, 4),
                grant(1, false, 5),
                committee.modify_event("Budget", 6, 0),
                grant(2, true, 7),
            ],
        )
        .await;

        assert_eq!(state.permissions.get(&key(1)), Some(&None));
        assert!(state.permissions[&key(2)].is_some());
        let (token_manager, voting) = state.committee_permissions(&state.committees[0]);
        assert_eq!(token_manager.len() + voting.len(), 1);
        assert!(state
            .effective_permissions()
            .all(|p| p.role == Role::from_low_u64_be(2)));
    }

    #[tokio::test]
    async fn test_regrant_replaces_tombstone() {
        let projector = projector(&Arc::new(MockContractCaller::new()));

        let state = fold(&projector, &[grant(1, true, 1), grant(1, false, 2), grant(1, true, 3)]).await;

        assert!(state.permissions[&key(1)].is_some());
    }

    #[tokio::test]
    async fn test_permission_from_foreign_contract_ignored() {
        let projector = projector(&Arc::new(MockContractCaller::new()));
        let mut forged = grant(1, true, 1);
        forged.contract_address = addr(0xBAD);

        let reduction = projector.reduce(Arc::new(AppState::default()), &forged).await;

        assert!(!reduction.changed);
        assert!(reduction.state.permissions.is_empty());
    }

    // =============================================================================
    // REMOVAL FINALITY
    // =============================================================================

    #[tokio::test]
    async fn test_events_after_removal_do_not_resurrect() {
        let committee = CommitteeFixture::new(0xA, true);
        let mock = contracts(&[committee]);
        mock.set_balance(committee.token, member(1), 1);
        mock.set_balance(committee.token, member(2), 1);
        let projector = projector(&mock);

        let removed = fold(
            &projector,
            &[
                committee.create_event(1, 0),
                committee.transfer_event(Address::zero(), member(1), 2, 0),
                committee.remove_event(3, 0),
            ],
        )
        .await;
        assert!(removed.committees.is_empty());

        for late in [
            committee.transfer_event(Address::zero(), member(2), 4, 0),
            committee.modify_event("Renamed", 4, 1),
            committee.remove_event(5, 0),
        ] {
            let reduction = projector.reduce(Arc::clone(&removed), &late).await;
            assert!(!reduction.changed, "{} changed the state", late.name());
            assert!(reduction.state.committees.is_empty());
        }
    }

    #[tokio::test]
    async fn test_store_unwatches_removed_token() {
        let committee = CommitteeFixture::new(0xA, true);
        let mock = contracts(&[committee]);
        let persistence = Arc::new(MemorySnapshotStore::new());
        let mut store = MaterializedStore::new(
            projector(&mock),
            Arc::clone(&persistence),
            AppState::default(),
            StoreConfig::default(),
        );
        let effects = RecordingEffectHandler::new();

        assert!(store.on_event(&committee.create_event(1, 0), &effects).await);
        assert!(store.on_event(&committee.remove_event(2, 0), &effects).await);
        assert!(!store.on_event(&committee.transfer_event(Address::zero(), member(1), 3, 0), &effects).await);

        assert_eq!(
            effects.effects(),
            vec![
                Effect::WatchContract { address: committee.token },
                Effect::UnwatchContract { address: committee.token },
            ]
        );
        assert!(persistence.snapshot().unwrap().committees.is_empty());
        assert!(store.handle().dead_letters().is_empty());
    }

    #[tokio::test]
    async fn test_failed_read_becomes_dead_letter() {
        let committee = CommitteeFixture::new(0xA, true);
        let mock = contracts(&[committee]);
        mock.fail(committee.token, "balanceOf");
        let mut store = MaterializedStore::new(
            projector(&mock),
            Arc::new(MemorySnapshotStore::new()),
            AppState::default(),
            StoreConfig::default(),
        );
        let effects = RecordingEffectHandler::new();

        store.on_event(&committee.create_event(1, 0), &effects).await;
        let before = store.state();
        let transfer = committee.transfer_event(Address::zero(), member(1), 2, 0);
        assert!(!store.on_event(&transfer, &effects).await);

        assert_eq!(*store.state(), *before);
        let dead_letters = store.handle().dead_letters();
        assert_eq!(dead_letters.len(), 1);
        assert_eq!(dead_letters[0].event, transfer);
    }
}
