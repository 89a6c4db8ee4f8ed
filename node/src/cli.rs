//! # CLI Interface
//!
//! Defines the command-line argument structure for `wavepay-node` using
//! `clap` derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

/// WavePay ledger node.
///
/// The single trusted ledger authority for a WavePay deployment: issues
/// wallets, verifies and applies signed transfers, reconciles offline POS
/// batches, and serves the REST API the MobilePOS clients talk to.
#[derive(Parser, Debug)]
#[command(
    name = "wavepay-node",
    about = "WavePay ledger node",
    version,
    propagate_version = true
)]
pub struct WavePayNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the WavePay node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the ledger node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "WAVEPAY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "WAVEPAY_METRICS_PORT", default_value_t = 5001)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "WAVEPAY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Seed two demo wallets (a funded buyer and an empty seller) at startup
    /// and print their credentials. Development only.
    #[arg(long, default_value_t = false)]
    pub seed_demo: bool,
}
