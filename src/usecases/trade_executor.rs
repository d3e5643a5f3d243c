//! Trade Executor - One-unit Buys and Sells
//!
//! Buys or sells exactly one whole unit of an outcome against a market
//! maker. The first trade against a market maker bootstraps approvals:
//! the ledger grants the market maker operator rights and the
//! collateral token grants it an allowance, each confirmed before the
//! trade is sent.

use std::sync::Arc;

use alloy::primitives::{Address, I256, TxHash, U256};
use anyhow::anyhow;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::metrics::BridgeMetrics;
use crate::config::TradingConfig;
use crate::domain::market::{Outcome, OutcomeAmounts, TradeAction};
use crate::ports::market_gateway::{MarketGateway, TxOutcome};
use crate::usecases::registry::ContractSet;

/// Why a trade did not complete.
#[derive(Debug, Error)]
pub enum TradeError {
  /// Granting the market maker ledger or collateral rights failed.
  #[error("allowance setup failed: {0:#}")]
  AllowanceSetup(#[source] anyhow::Error),
  /// The trade transaction was mined but reverted.
  #[error("trade transaction {tx_hash} reverted")]
  Reverted { tx_hash: TxHash },
  /// The node could not be reached or rejected a call.
  #[error("transport error: {0:#}")]
  Transport(#[source] anyhow::Error),
}

/// A confirmed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
  pub tx_hash: TxHash,
  pub block_number: Option<u64>,
  pub outcome: Outcome,
  pub action: TradeAction,
  /// Whether this trade had to bootstrap approvals first.
  pub approvals_submitted: bool,
}

/// Transaction parameters shared by every trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSettings {
  /// Gas limit ceiling for approvals and trades.
  pub gas_limit: u64,
  /// Collateral allowance granted on first trade.
  pub approval_amount: U256,
  /// Collateral limit passed to `trade`.
  pub min_acceptable: I256,
}

impl TradeSettings {
  pub fn from_config(config: &TradingConfig) -> anyhow::Result<Self> {
    Ok(Self {
      gas_limit: config.gas_limit,
      approval_amount: config.approval_amount_raw()?,
      min_acceptable: config.min_acceptable_raw()?,
    })
  }
}

/// Submits trades and their approval prerequisites.
pub struct TradeExecutor {
  settings: TradeSettings,
  metrics: Arc<BridgeMetrics>,
}

impl TradeExecutor {
  pub fn new(settings: TradeSettings, metrics: Arc<BridgeMetrics>) -> Self {
    Self { settings, metrics }
  }

  /// Buy or sell one unit of `outcome` and wait for confirmation.
  #[instrument(skip(self, gateway, contracts), fields(market = %market_maker))]
  pub async fn execute(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
    market_maker: Address,
    outcome: Outcome,
    action: TradeAction,
  ) -> Result<TradeReceipt, TradeError> {
    let result = self
      .execute_inner(gateway, contracts, market_maker, outcome, action)
      .await;

    let label = if result.is_ok() { "success" } else { "failure" };
    self
      .metrics
      .trades
      .with_label_values(&[&outcome.to_string(), &action.to_string(), label])
      .inc();

    result
  }

  async fn execute_inner(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
    market_maker: Address,
    outcome: Outcome,
    action: TradeAction,
  ) -> Result<TradeReceipt, TradeError> {
    let owner = gateway.address();

    let allowance = gateway
      .allowance(contracts.collateral, owner, market_maker)
      .await
      .map_err(TradeError::Transport)?;
    self.metrics.record_read("allowance");

    let approvals_submitted = allowance.is_zero();
    if approvals_submitted {
      self.bootstrap_approvals(gateway, contracts, market_maker).await?;
    }

    let amounts = OutcomeAmounts::unit(outcome, action);
    let tx = gateway
      .trade(
        market_maker,
        amounts,
        self.settings.min_acceptable,
        self.settings.gas_limit,
      )
      .await
      .map_err(TradeError::Transport)?;
    self.metrics.record_transaction("trade", tx.success);

    if !tx.success {
      warn!(tx_hash = %tx.tx_hash, "Trade reverted");
      return Err(TradeError::Reverted { tx_hash: tx.tx_hash });
    }

    info!(
      tx_hash = %tx.tx_hash,
      block = ?tx.block_number,
      %outcome,
      %action,
      "Trade confirmed"
    );

    Ok(TradeReceipt {
      tx_hash: tx.tx_hash,
      block_number: tx.block_number,
      outcome,
      action,
      approvals_submitted,
    })
  }

  /// Grant ledger operator rights, then the collateral allowance.
  ///
  /// Each step is confirmed before the next is sent.
  async fn bootstrap_approvals(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
    market_maker: Address,
  ) -> Result<(), TradeError> {
    info!(spender = %market_maker, "No collateral allowance; submitting approvals");

    let tx = gateway
      .set_approval_for_all(
        contracts.conditional_tokens,
        market_maker,
        true,
        self.settings.gas_limit,
      )
      .await
      .map_err(TradeError::AllowanceSetup)?;
    self.require_success("set_approval_for_all", &tx)?;

    let tx = gateway
      .approve(
        contracts.collateral,
        market_maker,
        self.settings.approval_amount,
        self.settings.gas_limit,
      )
      .await
      .map_err(TradeError::AllowanceSetup)?;
    self.require_success("approve", &tx)?;

    Ok(())
  }

  fn require_success(&self, kind: &str, tx: &TxOutcome) -> Result<(), TradeError> {
    self.metrics.record_transaction(kind, tx.success);
    if tx.success {
      Ok(())
    } else {
      Err(TradeError::AllowanceSetup(anyhow!(
        "{kind} transaction {} reverted",
        tx.tx_hash
      )))
    }
  }
}
