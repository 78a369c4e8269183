//! # State Reports
//!
//! Operator-facing summaries of the committees state, logged whenever the
//! engine finishes catching up.

use ca_01_contract_reader::RoleRegistry;
use shared_types::{address_hex, AppState, Committee, Permission};

/// One line per committee.
#[must_use]
pub fn committee_lines(state: &AppState) -> Vec<String> {
    state
        .committees
        .iter()
        .map(|committee| {
            let (token_manager, voting) = state.committee_permissions(committee);
            format!(
                "{} ({}, {}, {}): {} members, {} permissions",
                committee.name,
                committee.token_name(),
                committee.committee_type().name(),
                committee.voting_params.voting_type().name(),
                committee.members.len(),
                token_manager.len() + voting.len(),
            )
        })
        .collect()
}

/// Permissions held by a committee, with role names where known.
#[must_use]
pub fn permission_lines(state: &AppState, committee: &Committee, roles: &RoleRegistry) -> Vec<String> {
    let (token_manager, voting) = state.committee_permissions(committee);
    token_manager
        .iter()
        .chain(voting.iter())
        .map(|permission| describe(permission, roles))
        .collect()
}

fn describe(permission: &Permission, roles: &RoleRegistry) -> String {
    let role = roles
        .role_name(&permission.role)
        .map_or_else(|| format!("{:#x}", permission.role), str::to_string);
    let app = roles
        .app(&permission.app)
        .map_or_else(|| address_hex(&permission.app), |app| app.name.clone());
    format!("{} -> {}: {}", address_hex(&permission.entity), app, role)
}
