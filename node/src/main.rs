// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # WavePay Ledger Node
//!
//! Entry point for the `wavepay-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the REST API the MobilePOS
//! clients talk to.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the ledger node
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use wavepay_protocol::attestation::SimulatedSensorOracle;
use wavepay_protocol::ledger::LedgerEngine;
use wavepay_protocol::transaction::{Amount, Currency};

use cli::{Commands, WavePayNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WavePayNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the ledger node: API server plus metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "wavepay_node=info,wavepay_protocol=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        "starting wavepay-node"
    );

    // --- Ledger ---
    let engine = Arc::new(LedgerEngine::new());

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Demo wallets ---
    if args.seed_demo {
        seed_demo_wallets(&engine, &node_metrics);
    }

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: Arc::clone(&engine),
        oracle: Arc::new(SimulatedSensorOracle),
        metrics: Arc::clone(&node_metrics),
        started_at: chrono::Utc::now(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("wavepay-node stopped");
    Ok(())
}

/// Seeds a funded buyer wallet and an empty seller wallet so a fresh node can
/// demo the full transfer flow immediately.
///
/// Credentials go to stdout, not the log stream: the operator asked for them,
/// and log aggregation must never see a private key.
fn seed_demo_wallets(engine: &LedgerEngine, metrics: &NodeMetrics) {
    let buyer = engine.create_wallet(
        Amount::from_minor_units(1_000_000), // 10,000.00
        Currency::default(),
    );
    let seller = engine.create_wallet(Amount::ZERO, Currency::default());
    metrics.wallets_created_total.inc_by(2);
    metrics.wallet_count.set(engine.wallet_count() as i64);

    tracing::info!(
        buyer = %buyer.wallet.wallet_id,
        seller = %seller.wallet.wallet_id,
        "demo wallets seeded"
    );

    println!("Demo wallets created.");
    println!("  Buyer wallet   : {}", buyer.wallet.wallet_id);
    println!("  Buyer balance  : {} {}", buyer.wallet.balance, buyer.wallet.currency);
    println!("  Buyer key      : {}", buyer.private_key);
    println!("  Seller wallet  : {}", seller.wallet.wallet_id);
    println!("  Seller key     : {}", seller.private_key);
}

/// Prints version information to stdout.
fn print_version() {
    println!("wavepay-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
