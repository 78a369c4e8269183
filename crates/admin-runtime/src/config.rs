//! # Runtime Configuration
//!
//! `RuntimeConfig::default()` holds the development defaults. Every field
//! can be overridden by a command line flag or its `CA_*` environment
//! variable.

use std::path::PathBuf;
use std::time::Duration;

use ca_03_subscription_sync::{
    BackoffPolicy, SyncConfig, DEFAULT_LOG_BATCH_SIZE, DEFAULT_REORG_SAFETY_MARGIN,
};
use ca_05_materialized_store::StoreConfig;
use clap::Parser;
use shared_bus::{DEFAULT_DEAD_LETTER_CAPACITY, DEFAULT_PIPELINE_CAPACITY};
use shared_types::abi::decode_hex;
use shared_types::{Address, BlockNumber};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be set to a non-zero address")]
    MissingAddress(&'static str),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Complete daemon configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// JSON-RPC endpoint of the chain node.
    pub rpc_url: String,
    /// Organization kernel; the ACL address is read from it.
    pub kernel_address: Address,
    /// Committees app emitting the committee lifecycle events.
    pub committees_app: Address,
    /// Directory holding the snapshot and its lock file.
    pub data_dir: PathBuf,
    /// Optional JSON list of installed apps used to name roles.
    pub apps_file: Option<PathBuf>,
    pub sync: SyncConfig,
    pub store: StoreConfig,
    /// Delay between two live `eth_getLogs` polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    pub pipeline_capacity: usize,
    /// Balance reads in flight during a member rescan.
    pub read_concurrency: usize,
    /// Retry schedule for resolving the ACL at startup.
    pub bootstrap_backoff: BackoffPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            kernel_address: Address::zero(),
            committees_app: Address::zero(),
            data_dir: PathBuf::from("./data"),
            apps_file: None,
            sync: SyncConfig::default(),
            store: StoreConfig::default(),
            poll_interval: Duration::from_secs(4),
            request_timeout: Duration::from_secs(10),
            pipeline_capacity: DEFAULT_PIPELINE_CAPACITY,
            read_concurrency: ca_01_contract_reader::DEFAULT_READ_CONCURRENCY,
            bootstrap_backoff: BackoffPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernel_address.is_zero() {
            return Err(ConfigError::MissingAddress("kernel address"));
        }
        if self.committees_app.is_zero() {
            return Err(ConfigError::MissingAddress("committees app address"));
        }
        for (field, value) in [
            ("pipeline capacity", self.pipeline_capacity),
            ("read concurrency", self.read_concurrency),
            ("dead letter capacity", self.store.dead_letter_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.sync.log_batch_size == 0 {
            return Err(ConfigError::Zero { field: "log batch size" });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero { field: "poll interval" });
        }
        Ok(())
    }
}

/// Committee administration projection daemon
#[derive(Parser, Debug)]
#[command(name = "committee-admin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint URL
    #[arg(long, env = "CA_RPC_URL", default_value = "http://localhost:8545")]
    pub rpc_url: String,

    /// Organization kernel address
    #[arg(long, env = "CA_KERNEL_ADDRESS")]
    pub kernel: String,

    /// Committees app address
    #[arg(long, env = "CA_COMMITTEES_APP")]
    pub committees_app: String,

    /// Snapshot directory
    #[arg(long, env = "CA_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// JSON file listing installed apps and their roles
    #[arg(long, env = "CA_APPS_FILE")]
    pub apps_file: Option<PathBuf>,

    /// Blocks below the head treated as settled
    #[arg(long, env = "CA_REORG_SAFETY_MARGIN", default_value_t = DEFAULT_REORG_SAFETY_MARGIN)]
    pub reorg_safety_margin: u64,

    /// First block fetched for contracts without a cached height
    #[arg(long, env = "CA_GENESIS_BLOCK", default_value_t = 0)]
    pub genesis_block: BlockNumber,

    /// Maximum blocks per eth_getLogs request
    #[arg(long, env = "CA_LOG_BATCH_SIZE", default_value_t = DEFAULT_LOG_BATCH_SIZE)]
    pub log_batch_size: u64,

    /// Live polling interval in milliseconds
    #[arg(long, env = "CA_POLL_INTERVAL_MS", default_value_t = 4000)]
    pub poll_interval_ms: u64,

    /// Events buffered between synchronizers and the store
    #[arg(long, env = "CA_PIPELINE_CAPACITY", default_value_t = DEFAULT_PIPELINE_CAPACITY)]
    pub pipeline_capacity: usize,

    /// Dead letters retained for inspection
    #[arg(long, env = "CA_DEAD_LETTER_CAPACITY", default_value_t = DEFAULT_DEAD_LETTER_CAPACITY)]
    pub dead_letter_capacity: usize,

    /// Startup retries while resolving the ACL
    #[arg(long, env = "CA_BOOTSTRAP_RETRIES", default_value_t = 5)]
    pub bootstrap_retries: u32,

    /// Initial bootstrap retry delay in milliseconds
    #[arg(long, env = "CA_BOOTSTRAP_DELAY_MS", default_value_t = 500)]
    pub bootstrap_delay_ms: u64,
}

impl Cli {
    /// Build the runtime configuration on top of the defaults.
    pub fn into_config(self) -> Result<RuntimeConfig, ConfigError> {
        let defaults = RuntimeConfig::default();
        let config = RuntimeConfig {
            rpc_url: self.rpc_url,
            kernel_address: parse_address("kernel address", &self.kernel)?,
            committees_app: parse_address("committees app address", &self.committees_app)?,
            data_dir: self.data_dir,
            apps_file: self.apps_file,
            sync: SyncConfig {
                reorg_safety_margin: self.reorg_safety_margin,
                genesis_block: self.genesis_block,
                log_batch_size: self.log_batch_size,
                ..defaults.sync
            },
            store: StoreConfig {
                dead_letter_capacity: self.dead_letter_capacity,
                ..defaults.store
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            pipeline_capacity: self.pipeline_capacity,
            bootstrap_backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(self.bootstrap_delay_ms),
                max_retries: self.bootstrap_retries,
                ..defaults.bootstrap_backoff
            },
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a `0x`-prefixed (or bare) 20-byte hex address.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    let hex = value.trim().trim_start_matches("0x");
    if hex.len() != 40 {
        return Err(ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
    let bytes = decode_hex(hex).map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })?;
    Ok(Address::from_slice(&bytes))
}
