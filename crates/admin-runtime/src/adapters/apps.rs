//! Installed apps read from a JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use ca_01_contract_reader::{AppRegistry, ContractReadError, InstalledApp};

/// `AppRegistry` that reads a JSON array of installed apps.
pub struct FileAppRegistry {
    path: PathBuf,
}

impl FileAppRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AppRegistry for FileAppRegistry {
    async fn installed_apps(&self) -> Result<Vec<InstalledApp>, ContractReadError> {
        let invalid = |reason: String| ContractReadError::InvalidValue {
            field: "installed apps",
            reason,
        };
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| invalid(format!("{}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))
    }
}
