//! Market Bridge - Command-line Entry Point
//!
//! Exposes every bridge operation as a subcommand for operators and
//! local testing. Results are printed to stdout as JSON; logs go to
//! stderr.
//!
//! Wiring sequence:
//! 1. Parse CLI arguments
//! 2. Load config.toml + validate
//! 3. Init tracing (JSON or pretty, filtered by RUST_LOG or config)
//! 4. Build the bridge (key file + RPC connector)
//! 5. Run the subcommand; `watch` runs until SIGINT
//!
//! # Usage
//! ```bash
//! market-bridge address
//! market-bridge markets
//! market-bridge prices --market 0x...
//! market-bridge trade --market 0x... --outcome yes --action buy
//! market-bridge watch --market 0x...
//! ```

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use market_bridge::adapters::metrics::BridgeMetrics;
use market_bridge::config::{self, AppConfig, LogFormat};
use market_bridge::domain::market::{Outcome, TradeAction};
use market_bridge::usecases::MarketBridge;

#[derive(Parser)]
#[command(name = "market-bridge")]
#[command(about = "Prediction-market contract bridge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the device wallet address, creating the key on first use
    Address,

    /// Print the wallet's collateral balance
    Balance,

    /// List all markets in orchestrator order
    Markets,

    /// Print current buy/sell prices for both outcomes
    Prices {
        /// Market-maker address
        #[arg(long)]
        market: Address,
    },

    /// Print the wallet's position balances in a market
    Positions {
        /// Market-maker address
        #[arg(long)]
        market: Address,
    },

    /// Buy or sell one unit of an outcome
    Trade {
        /// Market-maker address
        #[arg(long)]
        market: Address,

        /// Outcome to trade (yes, no)
        #[arg(long)]
        outcome: Outcome,

        /// Trade direction (buy, sell)
        #[arg(long)]
        action: TradeAction,
    },

    /// Stream price changes as JSON lines until Ctrl+C
    Watch {
        /// Market-maker address
        #[arg(long)]
        market: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config_path = cli.config.to_string_lossy();
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize logging on stderr ─────────────────────
    init_tracing(&config);

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        rpc = %config.network.rpc_url,
        "Starting market bridge"
    );

    // ── 3. Wire the bridge ──────────────────────────────────
    let metrics = Arc::new(BridgeMetrics::new().context("Failed to create metrics")?);
    let bridge = MarketBridge::from_config(&config, Arc::clone(&metrics))?;

    // ── 4. Run the command ──────────────────────────────────
    match cli.command {
        Commands::Address => {
            let wallet = bridge.wallet().await?;
            print_json(&serde_json::json!({ "address": wallet.address }))?;
        }
        Commands::Balance => {
            let balance = bridge.balance().await?;
            print_json(&serde_json::json!({ "balance": balance }))?;
        }
        Commands::Markets => {
            print_json(&bridge.markets().await?)?;
        }
        Commands::Prices { market } => {
            print_json(&bridge.current_prices(market).await?)?;
        }
        Commands::Positions { market } => {
            print_json(&bridge.position_balances(market).await?)?;
        }
        Commands::Trade {
            market,
            outcome,
            action,
        } => match bridge.execute_trade(market, outcome, action).await {
            Ok(receipt) => print_json(&receipt)?,
            Err(e) => {
                error!(error = %e, "Trade failed");
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }))?;
                std::process::exit(1);
            }
        },
        Commands::Watch { market } => {
            watch(&bridge, &config, metrics, market).await?;
        }
    }

    Ok(())
}

/// Stream price ticks to stdout until SIGINT.
///
/// Serves `/metrics` alongside when enabled in config.
async fn watch<K, C>(
    bridge: &MarketBridge<K, C>,
    config: &AppConfig,
    metrics: Arc<BridgeMetrics>,
    market: Address,
) -> Result<()>
where
    K: market_bridge::ports::key_store::KeyStore,
    C: market_bridge::ports::market_gateway::Connector,
{
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let metrics_handle = config.metrics.enabled.then(|| {
        let bind_address = config.metrics.bind_address.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(bind_address, shutdown_rx).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    let subscription = bridge
        .listen_on_price_changes(market, |tick| {
            if let Err(e) = print_json(&tick) {
                error!(error = %e, "Failed to print price tick");
            }
        })
        .await?;

    info!(
        subscription = %subscription.id(),
        market = %subscription.market_maker(),
        "Watching price changes; Ctrl+C to stop"
    );

    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, shutting down");

    subscription.unsubscribe().await;

    let _ = shutdown_tx.send(());
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.app.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("Failed to serialize output")?;
    println!("{line}");
    Ok(())
}
