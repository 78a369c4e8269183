//! # Snapshot Restore
//!
//! Turns a persisted snapshot into a safe starting point.
//!
//! Member balances may have moved while the process was down and the token
//! streams only resume above their cached height, so restored committees
//! start with no members and one `RescanMembers` event each. The rescan
//! re-reads the balances of every previously known member.
//!
//! Permissions are kept: the ACL stream also resumes above its cached
//! height and would never replay the grants below it.

use shared_bus::{AdminEvent, NormalizedEvent};
use shared_types::{Address, AppState, BlockNumber, SubscriptionPhase};

/// Result of restoring a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub state: AppState,
    /// Cached height per watched contract.
    pub subscriptions: Vec<(Address, BlockNumber)>,
    /// Events to fold before the pipeline starts.
    pub rescans: Vec<NormalizedEvent>,
}

/// Restore a snapshot.
#[must_use]
pub fn restore(mut snapshot: AppState) -> Restored {
    let mut rescans = Vec::new();
    for committee in &mut snapshot.committees {
        let candidates = committee.member_addresses();
        committee.members.clear();
        if candidates.is_empty() {
            continue;
        }
        rescans.push(NormalizedEvent::marker(
            AdminEvent::RescanMembers {
                committee_address: committee.address,
                candidates,
            },
            committee.address,
            0,
        ));
    }

    let mut subscriptions = Vec::with_capacity(snapshot.cached_subscriptions.len());
    for (address, record) in &mut snapshot.cached_subscriptions {
        record.is_syncing = false;
        record.phase = SubscriptionPhase::Unsynced;
        subscriptions.push((*address, record.block_number));
    }

    snapshot.is_syncing = false;

    Restored {
        state: snapshot,
        subscriptions,
        rescans,
    }
}
