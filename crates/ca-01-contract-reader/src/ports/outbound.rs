//! # Outbound Ports
//!
//! Traits for the host capabilities the reader depends on.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{AbiValue, Address};

use crate::domain::{ContractAbi, ContractReadError, InstalledApp};

/// Contract call capability - outbound port.
///
/// Performs one point-in-time read. No retries; callers decide.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    /// Call `method` of the contract at `contract`.
    async fn call(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
        args: &[AbiValue],
    ) -> Result<AbiValue, ContractReadError>;
}

/// Installed application registry - outbound port.
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Every app installed in the organization, with its roles.
    async fn installed_apps(&self) -> Result<Vec<InstalledApp>, ContractReadError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

type CallKey = (Address, String, Vec<AbiValue>);

/// In-memory contract caller for testing.
///
/// Unconfigured calls fail with `CallFailed`.
#[derive(Default)]
pub struct MockContractCaller {
    responses: RwLock<HashMap<CallKey, AbiValue>>,
    failing: RwLock<HashSet<(Address, String)>>,
    failing_times: RwLock<HashMap<(Address, String), u32>>,
    calls: AtomicUsize,
    log: RwLock<Vec<(Address, String)>>,
}

impl MockContractCaller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the value returned for `method(args)` on `contract`.
    pub fn set(&self, contract: Address, method: &str, args: Vec<AbiValue>, value: AbiValue) {
        self.responses
            .write()
            .insert((contract, method.to_string(), args), value);
    }

    /// Configure a token balance.
    pub fn set_balance(&self, token: Address, holder: Address, balance: u64) {
        self.set(
            token,
            "balanceOf",
            vec![AbiValue::Address(holder)],
            AbiValue::Uint(balance.into()),
        );
    }

    /// Make every call to `method` on `contract` fail.
    pub fn fail(&self, contract: Address, method: &str) {
        self.failing.write().insert((contract, method.to_string()));
    }

    /// Make the next `count` calls to `method` on `contract` fail.
    pub fn fail_times(&self, contract: Address, method: &str, count: u32) {
        self.failing_times
            .write()
            .insert((contract, method.to_string()), count);
    }

    /// Undo `fail`.
    pub fn recover(&self, contract: Address, method: &str) {
        self.failing.write().remove(&(contract, method.to_string()));
    }

    /// Total calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls made to `method` on any contract.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> usize {
        self.log.read().iter().filter(|(_, m)| m == method).count()
    }
}

#[async_trait]
impl ContractCaller for MockContractCaller {
    async fn call(
        &self,
        contract: Address,
        abi: ContractAbi,
        method: &str,
        args: &[AbiValue],
    ) -> Result<AbiValue, ContractReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.write().push((contract, method.to_string()));

        if abi.method(method).is_none() {
            return Err(ContractReadError::UnknownMethod {
                abi,
                method: method.to_string(),
            });
        }

        let key = (contract, method.to_string());
        if self.failing.read().contains(&key) {
            return Err(ContractReadError::Network("Mock failure".to_string()));
        }
        if let Some(remaining) = self.failing_times.write().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ContractReadError::Network("Mock failure".to_string()));
            }
        }

        self.responses
            .read()
            .get(&(contract, method.to_string(), args.to_vec()))
            .cloned()
            .ok_or_else(|| ContractReadError::CallFailed {
                contract,
                method: method.to_string(),
                reason: "no mock response".to_string(),
            })
    }
}

/// Fixed app registry for testing.
#[derive(Default, Clone)]
pub struct MockAppRegistry {
    pub apps: Vec<InstalledApp>,
    pub should_fail: bool,
}

#[async_trait]
impl AppRegistry for MockAppRegistry {
    async fn installed_apps(&self) -> Result<Vec<InstalledApp>, ContractReadError> {
        if self.should_fail {
            return Err(ContractReadError::Network("Mock failure".to_string()));
        }
        Ok(self.apps.clone())
    }
}
