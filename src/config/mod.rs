//! Configuration Module - TOML-based Bridge Configuration
//!
//! Loads and validates configuration from `config.toml` once at
//! startup. The RPC endpoint and the orchestrator address are
//! externalized here - nothing is hardcoded in the use-case layer.
//! Every other contract address is discovered on-chain.

pub mod loader;

use std::path::PathBuf;

use alloy::primitives::{Address, I256, U256};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::fixed_point::{parse_amount, parse_signed_amount};

/// Top-level bridge configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any connection is opened.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Application identity and logging.
  #[serde(default)]
  pub app: AppSection,
  /// Blockchain node endpoint.
  pub network: NetworkConfig,
  /// Entry-point contract address.
  pub contracts: ContractsConfig,
  /// Signing-key persistence.
  #[serde(default)]
  pub keystore: KeystoreConfig,
  /// Trade submission parameters.
  #[serde(default)]
  pub trading: TradingConfig,
  /// Price-change subscription parameters.
  #[serde(default)]
  pub events: EventsConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable name used in logs.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Log output format.
  #[serde(default)]
  pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  /// Structured JSON lines.
  #[default]
  Json,
  /// Human-readable output for local use.
  Pretty,
}

/// Blockchain node configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  /// HTTP JSON-RPC endpoint.
  pub rpc_url: String,
  /// Expected chain id; checked once on connect when set.
  #[serde(default)]
  pub chain_id: Option<u64>,
}

/// Contract entry point.
///
/// Only the orchestrator is configured; collateral, ledger and market
/// makers are discovered through it.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
  /// Orchestrator contract address (0x-prefixed hex).
  pub orchestrator: String,
}

impl ContractsConfig {
  /// Parsed orchestrator address.
  pub fn orchestrator_address(&self) -> Result<Address> {
    self
      .orchestrator
      .parse()
      .with_context(|| format!("Invalid orchestrator address: {}", self.orchestrator))
  }
}

/// Signing-key persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeystoreConfig {
  /// Path of the JSON key file.
  #[serde(default = "default_key_path")]
  pub path: PathBuf,
}

/// Trade submission configuration.
///
/// Amounts are decimal strings in whole collateral units.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
  /// Gas limit ceiling for every transaction.
  #[serde(default = "default_gas_limit")]
  pub gas_limit: u64,
  /// Collateral allowance granted to a market maker on first trade.
  #[serde(default = "default_approval_amount")]
  pub approval_amount: String,
  /// Collateral limit passed to `trade`; 0 disables slippage protection.
  #[serde(default = "default_min_acceptable")]
  pub min_acceptable: String,
}

impl TradingConfig {
  /// Approval amount in fixed point.
  pub fn approval_amount_raw(&self) -> Result<U256> {
    parse_amount(&self.approval_amount).context("Invalid trading.approval_amount")
  }

  /// Collateral limit in fixed point.
  pub fn min_acceptable_raw(&self) -> Result<I256> {
    parse_signed_amount(&self.min_acceptable).context("Invalid trading.min_acceptable")
  }
}

/// Price-change subscription configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
  /// First block replayed for a new subscription (0 = full history).
  #[serde(default)]
  pub replay_from_block: u64,
  /// Log filter polling interval (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
  /// Buffered events per subscription before back-pressure.
  #[serde(default = "default_channel_capacity")]
  pub channel_capacity: usize,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve Prometheus metrics over HTTP.
  #[serde(default)]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      log_format: LogFormat::default(),
    }
  }
}

impl Default for KeystoreConfig {
  fn default() -> Self {
    Self {
      path: default_key_path(),
    }
  }
}

impl Default for TradingConfig {
  fn default() -> Self {
    Self {
      gas_limit: default_gas_limit(),
      approval_amount: default_approval_amount(),
      min_acceptable: default_min_acceptable(),
    }
  }
}

impl Default for EventsConfig {
  fn default() -> Self {
    Self {
      replay_from_block: 0,
      poll_interval_ms: default_poll_interval(),
      channel_capacity: default_channel_capacity(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "market-bridge".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_key_path() -> PathBuf {
  PathBuf::from("data/signing_key.json")
}

fn default_gas_limit() -> u64 {
  1_000_000
}

fn default_approval_amount() -> String {
  "100".to_string()
}

fn default_min_acceptable() -> String {
  "0".to_string()
}

fn default_poll_interval() -> u64 {
  1_000
}

fn default_channel_capacity() -> usize {
  256
}

fn default_metrics_addr() -> String {
  "127.0.0.1:9090".to_string()
}
