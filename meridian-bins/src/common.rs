//! Common utilities for the demo binaries: CLI parsing, logging setup,
//! and a status printer shared by anything in this crate.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meridian_core::engine::EngineStatus;

/// Common CLI arguments for the demo binaries.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Ticker to trade against the simulated venue.
    #[arg(short, long, default_value = "AAPL")]
    pub symbol: String,

    /// Number of synthetic quote ticks to run before shutting down.
    #[arg(short, long, default_value_t = 1000)]
    pub ticks: u64,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Initialize tracing/logging.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    Ok(())
}

/// Print a final engine status snapshot.
pub fn print_status(status: &EngineStatus) {
    tracing::info!("=== Final Engine Status ===");
    tracing::info!("Orders registered: {}", status.orders_registered);
    tracing::info!("Circuit state: {:?}", status.circuit_state);
    tracing::info!("Orders accepted: {}", status.metrics.orders_accepted);
    tracing::info!("Orders filled: {}", status.metrics.orders_filled);
    tracing::info!("Orders rejected: {}", status.metrics.orders_rejected);
    tracing::info!("Uptime: {} ns", status.uptime_ns);
}
