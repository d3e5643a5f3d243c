//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    rpc_url = %config.network.rpc_url,
    orchestrator = %config.contracts.orchestrator,
    keystore = %config.keystore.path.display(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A well-formed HTTP(S) RPC endpoint
/// - A non-zero orchestrator address
/// - Parseable trade amounts and a positive gas limit
/// - Sensible event polling parameters
fn validate_config(config: &AppConfig) -> Result<()> {
  // Network validation
  let rpc_url = config.network.rpc_url.trim();
  anyhow::ensure!(!rpc_url.is_empty(), "network.rpc_url must not be empty");
  anyhow::ensure!(
    rpc_url.starts_with("http://") || rpc_url.starts_with("https://"),
    "network.rpc_url must be an HTTP(S) endpoint, got {rpc_url}"
  );
  if let Some(chain_id) = config.network.chain_id {
    anyhow::ensure!(chain_id > 0, "network.chain_id must be positive");
  }

  // Contract validation
  let orchestrator = config.contracts.orchestrator_address()?;
  anyhow::ensure!(
    !orchestrator.is_zero(),
    "contracts.orchestrator must not be the zero address"
  );

  // Keystore validation
  anyhow::ensure!(
    !config.keystore.path.as_os_str().is_empty(),
    "keystore.path must not be empty"
  );

  // Trading validation
  anyhow::ensure!(
    config.trading.gas_limit > 0,
    "trading.gas_limit must be positive"
  );
  let approval = config.trading.approval_amount_raw()?;
  anyhow::ensure!(
    !approval.is_zero(),
    "trading.approval_amount must be positive, got {}",
    config.trading.approval_amount
  );
  config.trading.min_acceptable_raw()?;

  // Events validation
  anyhow::ensure!(
    config.events.poll_interval_ms > 0,
    "events.poll_interval_ms must be positive"
  );
  anyhow::ensure!(
    config.events.channel_capacity > 0,
    "events.channel_capacity must be positive"
  );

  // Metrics validation
  if config.metrics.enabled {
    config
      .metrics
      .bind_address
      .parse::<std::net::SocketAddr>()
      .with_context(|| format!("Invalid metrics.bind_address: {}", config.metrics.bind_address))?;
  }

  Ok(())
}
