//! # Role Registry
//!
//! Maps bytes32 role identifiers to their names across installed apps.

use std::collections::HashMap;

use shared_types::{Address, Role};
use tracing::debug;

use crate::domain::{ContractReadError, InstalledApp, RoleDescriptor};
use crate::ports::AppRegistry;

/// Role names for every installed app.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    apps: Vec<InstalledApp>,
    names: HashMap<Role, String>,
}

impl RoleRegistry {
    /// Build from a list of apps. The first name seen for a role wins.
    #[must_use]
    pub fn new(apps: Vec<InstalledApp>) -> Self {
        let mut names = HashMap::new();
        for role in apps.iter().flat_map(|app| app.roles.iter()) {
            names.entry(role.bytes).or_insert_with(|| role.name.clone());
        }
        Self { apps, names }
    }

    /// Load every installed app from the registry.
    pub async fn load<R: AppRegistry + ?Sized>(registry: &R) -> Result<Self, ContractReadError> {
        let apps = registry.installed_apps().await?;
        debug!(apps = apps.len(), "loaded installed apps");
        Ok(Self::new(apps))
    }

    /// Name of a role, if any app declares it.
    #[must_use]
    pub fn role_name(&self, role: &Role) -> Option<&str> {
        self.names.get(role).map(String::as_str)
    }

    /// Number of distinct roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// App installed at `proxy`.
    #[must_use]
    pub fn app(&self, proxy: &Address) -> Option<&InstalledApp> {
        self.apps.iter().find(|app| app.proxy_address == *proxy)
    }

    /// Roles of the app at `proxy`, sorted by name.
    #[must_use]
    pub fn app_roles(&self, proxy: &Address) -> Vec<RoleDescriptor> {
        let mut roles = self
            .app(proxy)
            .map(|app| app.roles.clone())
            .unwrap_or_default();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}
