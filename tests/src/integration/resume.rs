//! # Resume Tests
//!
//! A persisted height `N` means the next session requests history from
//! `N + 1` only, and nothing at or below `N` is folded twice.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ca_02_event_normalizer::EventNormalizer;
    use ca_03_subscription_sync::{MockChainLogSource, SubscriptionSynchronizer};
    use ca_05_materialized_store::{FileSnapshotStore, SnapshotPersistence};
    use shared_bus::event_pipeline;
    use shared_types::{Address, Member, Role, SubscriptionPhase, U256};
    use tokio_util::sync::CancellationToken;

    use crate::fixtures::{
        acl, addr, committees_app, contracts, is_synced, member, set_permission_log, sync_config,
        CommitteeFixture, Session,
    };

    // =============================================================================
    // SYNCHRONIZER
    // =============================================================================

    #[tokio::test]
    async fn test_catch_up_starts_after_cached_height() {
        let committee = CommitteeFixture::new(0xA, true);
        let source = Arc::new(MockChainLogSource::new(1_000));
        source.add_log(committee.create_log(10, 0));
        source.add_log(committee.modify_log("Old", 500, 0));
        source.add_log(committee.modify_log("Settled", 700, 0));
        source.add_log(committee.modify_log("Recent", 950, 3));
        let (sender, mut receiver) = event_pipeline(64);
        let synchronizer = SubscriptionSynchronizer::new(
            Arc::clone(&source),
            Arc::new(EventNormalizer::new()),
            sender,
            sync_config(100),
        );

        let done = synchronizer
            .catch_up(committees_app(), Some(500), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(done.events_sent, 2);
        assert!(source.requested_ranges().iter().all(|(from, _)| *from >= 501));
        let events: Vec<_> = std::iter::from_fn(|| receiver.try_recv()).collect();
        assert!(events
            .iter()
            .filter(|e| !e.event.is_marker())
            .all(|e| e.block_number > 500));
        assert_eq!(
            events.iter().map(|e| e.name()).collect::<Vec<_>>(),
            vec![
                "SYNC_SUBSCRIPTION_SYNCING",
                "ModifyCommitteeInfo",
                "SYNC_SUBSCRIPTION_CACHED",
                "ModifyCommitteeInfo",
                "SYNC_SUBSCRIPTION_SYNCED",
            ]
        );
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[tokio::test]
    async fn test_restart_resumes_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let committee = CommitteeFixture::new(0xA, true);
        let role = Role::from_low_u64_be(1);
        let watched = [committees_app(), acl(), committee.token];

        // First session: full history up to block 1000.
        let first_source = Arc::new(MockChainLogSource::new(1_000));
        first_source.add_log(committee.create_log(10, 0));
        first_source.add_log(committee.transfer_log(Address::zero(), member(1), 20, 0));
        first_source.add_log(set_permission_log(committee.address, addr(0xF0), role, true, 30, 0));
        let first_contracts = contracts(&[committee]);
        first_contracts.set_balance(committee.token, member(1), 1);

        let session = Session::start(dir.path(), first_source, first_contracts, 100)
            .await
            .unwrap();
        let state = session.synced(&watched).await.unwrap();
        assert_eq!(state.committees[0].members, vec![Member(member(1), U256::one())]);
        session.stop().await;

        let saved = FileSnapshotStore::open(dir.path()).unwrap().load().unwrap().unwrap();
        for address in watched {
            assert_eq!(saved.subscription(&address).unwrap().block_number, 900);
        }

        // Second session: the chain moved to 1200 with one more transfer.
        let second_source = Arc::new(MockChainLogSource::new(1_200));
        second_source.add_log(committee.create_log(10, 0));
        second_source.add_log(committee.transfer_log(Address::zero(), member(1), 20, 0));
        second_source.add_log(committee.transfer_log(Address::zero(), member(2), 1_100, 0));
        let second_contracts = contracts(&[committee]);
        second_contracts.set_balance(committee.token, member(1), 1);
        second_contracts.set_balance(committee.token, member(2), 1);

        let session = Session::start(dir.path(), Arc::clone(&second_source), second_contracts, 100)
            .await
            .unwrap();
        let state = session
            .wait_for(|state| {
                is_synced(state, &watched)
                    && state.committees.first().map_or(0, |c| c.members.len()) == 2
            })
            .await
            .unwrap();

        assert!(second_source
            .requested_ranges()
            .iter()
            .all(|(from, _)| *from >= 901));
        assert_eq!(
            state.committees[0].members,
            vec![Member(member(1), U256::one()), Member(member(2), U256::one())]
        );
        assert_eq!(state.effective_permissions().count(), 1);
        assert_eq!(state.committees.len(), 1);
        session.stop().await;

        let saved = FileSnapshotStore::open(dir.path()).unwrap().load().unwrap().unwrap();
        let record = saved.subscription(&committee.token).unwrap();
        assert_eq!(record.block_number, 1_100);
        assert_eq!(record.phase, SubscriptionPhase::Synced);
        assert!(!saved.is_syncing);
    }

    #[tokio::test]
    async fn test_restart_rescans_members_before_watching() {
        let dir = tempfile::tempdir().unwrap();
        let committee = CommitteeFixture::new(0xA, true);
        let watched = [committees_app(), acl(), committee.token];

        let source = Arc::new(MockChainLogSource::new(1_000));
        source.add_log(committee.create_log(10, 0));
        source.add_log(committee.transfer_log(Address::zero(), member(1), 20, 0));
        let caller = contracts(&[committee]);
        caller.set_balance(committee.token, member(1), 1);
        let session = Session::start(dir.path(), Arc::clone(&source), Arc::clone(&caller), 100)
            .await
            .unwrap();
        session.synced(&watched).await.unwrap();
        session.stop().await;

        // Member 1 left while the engine was down.
        caller.set_balance(committee.token, member(1), 0);
        let calls_before = caller.calls_to("balanceOf");
        let session = Session::start(dir.path(), source, Arc::clone(&caller), 100)
            .await
            .unwrap();

        let state = session.store().state();
        assert!(state.committees[0].members.is_empty());
        assert_eq!(caller.calls_to("balanceOf"), calls_before + 1);
        assert!(session.manager().is_watching(&committee.token));
        session.stop().await;
    }

    #[tokio::test]
    async fn test_second_session_cannot_share_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockChainLogSource::new(10));
        let session = Session::start(dir.path(), Arc::clone(&source), contracts(&[]), 5)
            .await
            .unwrap();

        assert!(Session::start(dir.path(), source, contracts(&[]), 5).await.is_err());
        session.stop().await;
    }
}
