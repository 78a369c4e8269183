//! # End-to-End Flows
//!
//! Raw logs on a mock chain, through the normalizer and synchronizers, into
//! the materialized store.
//!
//! ## Flow Tested:
//!
//! 1. `CreateCommittee` from the committees app starts watching the token
//! 2. Token `Transfer`s trigger member rescans
//! 3. Live logs keep folding after the catch-up
//! 4. `RemoveCommittee` stops the token subscription

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ca_03_subscription_sync::MockChainLogSource;
    use shared_types::{Address, LogEntry, Member, U256};

    use crate::fixtures::{acl, committees_app, contracts, member, CommitteeFixture, Session};

    fn committee() -> CommitteeFixture {
        CommitteeFixture::new(0xA, true)
    }

    fn watched() -> [Address; 3] {
        [committees_app(), acl(), committee().token]
    }

    // =============================================================================
    // CATCH-UP
    // =============================================================================

    #[tokio::test]
    async fn test_unique_token_committee_membership() {
        let dir = tempfile::tempdir().unwrap();
        let committee = committee();
        let source = Arc::new(MockChainLogSource::new(1_000));
        source.add_log(committee.create_log(10, 0));
        source.add_log(committee.transfer_log(Address::zero(), member(1), 20, 0));
        source.add_log(committee.transfer_log(Address::zero(), member(2), 30, 0));
        let caller = contracts(&[committee]);
        caller.set_balance(committee.token, member(1), 1);
        caller.set_balance(committee.token, member(2), 0);

        let session = Session::start(dir.path(), source, caller, 100).await.unwrap();
        let state = session.synced(&watched()).await.unwrap();

        assert_eq!(state.committees.len(), 1);
        let projected = &state.committees[0];
        assert_eq!(projected.address, committee.address);
        assert_eq!(projected.name, "Finance");
        assert_eq!(projected.members, vec![Member(member(1), U256::one())]);
        assert!(projected.token_params.unique);
        assert!(session.store().dead_letters().is_empty());
        session.stop().await;
    }

    #[tokio::test]
    async fn test_recent_history_is_folded() {
        let dir = tempfile::tempdir().unwrap();
        let committee = committee();
        let source = Arc::new(MockChainLogSource::new(1_000));
        source.add_log(committee.create_log(10, 0));
        // Inside the reorg margin: delivered by the recent phase.
        source.add_log(committee.modify_log("Treasury", 990, 0));
        let caller = contracts(&[committee]);

        let session = Session::start(dir.path(), source, caller, 100).await.unwrap();
        let state = session.synced(&watched()).await.unwrap();

        assert_eq!(state.committees[0].name, "Treasury");
        assert_eq!(state.subscription(&committees_app()).unwrap().block_number, 900);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_log_does_not_stall_sync() {
        let dir = tempfile::tempdir().unwrap();
        let committee = committee();
        let source = Arc::new(MockChainLogSource::new(1_000));
        let mut truncated = committee.create_log(5, 0);
        truncated.data.truncate(31);
        source.add_log(truncated);
        source.add_log(committee.create_log(10, 0));

        let session = Session::start(dir.path(), source, contracts(&[committee]), 100)
            .await
            .unwrap();
        let state = session.synced(&watched()).await.unwrap();

        assert_eq!(state.committees.len(), 1);
        session.stop().await;
    }

    // =============================================================================
    // LIVE
    // =============================================================================

    async fn live_session(dir: &std::path::Path) -> (Session, Arc<MockChainLogSource>) {
        let committee = committee();
        let source = Arc::new(MockChainLogSource::new(1_000));
        source.add_log(committee.create_log(10, 0));
        let caller = contracts(&[committee]);
        caller.set_balance(committee.token, member(1), 1);
        let session = Session::start(dir, Arc::clone(&source), caller, 100)
            .await
            .unwrap();
        session.synced(&watched()).await.unwrap();
        (session, source)
    }

    async fn push_when_subscribed(source: &MockChainLogSource, log: LogEntry, subscribers: usize) {
        while source.live_subscribers() < subscribers {
            tokio::task::yield_now().await;
        }
        source.push_live(log);
    }

    #[tokio::test]
    async fn test_live_transfer_updates_members() {
        let dir = tempfile::tempdir().unwrap();
        let (session, source) = live_session(dir.path()).await;
        let committee = committee();

        push_when_subscribed(
            &source,
            committee.transfer_log(Address::zero(), member(1), 1_001, 0),
            3,
        )
        .await;
        let state = session
            .wait_for(|state| !state.committees.is_empty() && !state.committees[0].members.is_empty())
            .await
            .unwrap();

        assert_eq!(state.committees[0].members, vec![Member(member(1), U256::one())]);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_live_removal_stops_token_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let (session, source) = live_session(dir.path()).await;
        let committee = committee();
        assert!(session.manager().is_watching(&committee.token));

        push_when_subscribed(&source, committee.remove_log(1_001, 0), 3).await;
        session
            .wait_for(|state| state.committees.is_empty())
            .await
            .unwrap();

        assert!(!session.manager().is_watching(&committee.token));
        let mut expected = vec![committees_app(), acl()];
        expected.sort();
        assert_eq!(session.manager().watched(), expected);
        session.stop().await;
    }
}
