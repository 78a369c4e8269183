//! # Committee Admin
//!
//! ## Usage
//!
//! ```bash
//! committee-admin --kernel 0x... --committees-app 0x... --rpc-url http://localhost:8545
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use committee_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

use admin_runtime::{AdminRuntime, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = cli.into_config().context("Invalid configuration")?;
    let runtime = AdminRuntime::start(config).await?;

    info!("Engine is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
