//! Market Gateway Port - On-chain Contract Interface
//!
//! Defines every contract call the bridge consumes from the
//! orchestrator, the per-market market maker, the collateral token and
//! the conditional-token ledger. Addresses are passed explicitly so a
//! single connection serves every market. Implemented with alloy-rs.

use std::sync::Arc;

use alloy::primitives::{Address, I256, TxHash, U256};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::key::SigningKey;
use crate::domain::market::{Market, Outcome, OutcomeAmounts};

/// Outcome of a transaction after waiting for its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
  /// Transaction hash.
  pub tx_hash: TxHash,
  /// Receipt status: `false` means the transaction reverted.
  pub success: bool,
  /// Block the transaction was mined in.
  pub block_number: Option<u64>,
}

/// Raw `AMMPriceChanged` event fields, still in fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceChangedLog {
  /// Net cost of buying one Yes.
  pub buy_yes: I256,
  /// Net cost reported for selling one Yes.
  pub sell_yes: I256,
  /// Net cost of buying one No.
  pub buy_no: I256,
  /// Net cost reported for selling one No.
  pub sell_no: I256,
  /// Event timestamp (seconds).
  pub timestamp: U256,
  /// Block the event was emitted in.
  pub block_number: Option<u64>,
}

/// Trait for on-chain prediction-market interactions via alloy-rs.
///
/// One instance is bound to one signer; transaction methods send from
/// `address()` and wait for confirmation before returning.
#[async_trait]
pub trait MarketGateway: Send + Sync + 'static {
  /// Address of the signer bound to this gateway.
  fn address(&self) -> Address;

  // ── Orchestrator ────────────────────────────────────────

  /// `collateralToken()` on the orchestrator.
  async fn collateral_token(&self, orchestrator: Address) -> anyhow::Result<Address>;

  /// `conditionalTokens()` on the orchestrator.
  async fn conditional_tokens(&self, orchestrator: Address) -> anyhow::Result<Address>;

  /// `getMarketsCount()` on the orchestrator.
  async fn markets_count(&self, orchestrator: Address) -> anyhow::Result<u64>;

  /// `getMarketDetails(index)` on the orchestrator.
  async fn market_details(&self, orchestrator: Address, index: u64) -> anyhow::Result<Market>;

  /// `getOutcomeBalance(owner, positionId)` on the orchestrator.
  async fn outcome_balance(
    &self,
    orchestrator: Address,
    owner: Address,
    position_id: U256,
  ) -> anyhow::Result<U256>;

  // ── Market maker ────────────────────────────────────────

  /// `calcNetCost([yes, no])`; read-only quote.
  async fn calc_net_cost(
    &self,
    market_maker: Address,
    amounts: OutcomeAmounts,
  ) -> anyhow::Result<I256>;

  /// `generateAtomicPositionId(outcomeIndex)`.
  async fn position_id(&self, market_maker: Address, outcome: Outcome) -> anyhow::Result<U256>;

  /// `trade([yes, no], collateralLimit)` and wait for the receipt.
  async fn trade(
    &self,
    market_maker: Address,
    amounts: OutcomeAmounts,
    collateral_limit: I256,
    gas_limit: u64,
  ) -> anyhow::Result<TxOutcome>;

  /// Stream `AMMPriceChanged` logs, starting with history from `from_block`.
  ///
  /// Events are delivered in node order. The stream ends when the
  /// receiver is dropped.
  async fn price_changes(
    &self,
    market_maker: Address,
    from_block: u64,
  ) -> anyhow::Result<mpsc::Receiver<PriceChangedLog>>;

  // ── Collateral token (ERC-20) ───────────────────────────

  /// `balanceOf(owner)` on an ERC-20 token.
  async fn token_balance(&self, token: Address, owner: Address) -> anyhow::Result<U256>;

  /// `allowance(owner, spender)` on an ERC-20 token.
  async fn allowance(
    &self,
    token: Address,
    owner: Address,
    spender: Address,
  ) -> anyhow::Result<U256>;

  /// `approve(spender, amount)` and wait for the receipt.
  async fn approve(
    &self,
    token: Address,
    spender: Address,
    amount: U256,
    gas_limit: u64,
  ) -> anyhow::Result<TxOutcome>;

  // ── Conditional-token ledger (ERC-1155) ─────────────────

  /// `setApprovalForAll(operator, approved)` and wait for the receipt.
  async fn set_approval_for_all(
    &self,
    ledger: Address,
    operator: Address,
    approved: bool,
    gas_limit: u64,
  ) -> anyhow::Result<TxOutcome>;
}

/// Opens gateways bound to a signing key.
///
/// The network endpoint is fixed by the implementor's configuration;
/// callers cannot redirect it.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
  /// Build a gateway signing with `key`.
  async fn connect(&self, key: &SigningKey) -> anyhow::Result<Arc<dyn MarketGateway>>;
}
