//! Market Queries - Read-only Views
//!
//! Collateral balance, market listing, indicative prices and held
//! positions. Every amount crosses the boundary as a decimal string or
//! a 3-significant-digit `Price`; raw fixed point never leaks out.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::adapters::metrics::BridgeMetrics;
use crate::domain::fixed_point::{format_amount, Price};
use crate::domain::market::{
  CurrentPrices, Market, Outcome, OutcomeAmounts, PositionBalances, PriceQuote, TradeAction,
};
use crate::ports::market_gateway::MarketGateway;
use crate::usecases::registry::ContractSet;

/// Read-only queries against a connected gateway.
pub struct MarketQueries {
  metrics: Arc<BridgeMetrics>,
}

impl MarketQueries {
  pub fn new(metrics: Arc<BridgeMetrics>) -> Self {
    Self { metrics }
  }

  /// Collateral balance of the gateway's signer, e.g. `"100.0"`.
  #[instrument(skip_all)]
  pub async fn balance(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
  ) -> Result<String> {
    let raw = gateway
      .token_balance(contracts.collateral, gateway.address())
      .await
      .context("Failed to read collateral balance")?;
    self.metrics.record_read("balance_of");

    Ok(format_amount(raw))
  }

  /// All markets in orchestrator index order.
  ///
  /// Reads are issued one at a time; any failed read fails the whole
  /// listing.
  #[instrument(skip_all)]
  pub async fn markets(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
  ) -> Result<Vec<Market>> {
    let count = gateway
      .markets_count(contracts.orchestrator)
      .await
      .context("Failed to read markets count")?;
    self.metrics.record_read("get_markets_count");

    let mut markets = Vec::new();
    for index in 0..count {
      let market = gateway
        .market_details(contracts.orchestrator, index)
        .await
        .with_context(|| format!("Failed to read market details at index {index}"))?;
      self.metrics.record_read("get_market_details");
      markets.push(market);
    }

    debug!(count = markets.len(), "Markets listed");
    Ok(markets)
  }

  /// Cost of buying one unit and proceeds of selling one unit, per outcome.
  ///
  /// The market maker reports sell net cost as a negative number; it is
  /// negated so both sides read as positive prices.
  #[instrument(skip(self, gateway), fields(market = %market_maker))]
  pub async fn current_prices(
    &self,
    gateway: &dyn MarketGateway,
    market_maker: Address,
  ) -> Result<CurrentPrices> {
    let yes = self.quote(gateway, market_maker, Outcome::Yes).await?;
    let no = self.quote(gateway, market_maker, Outcome::No).await?;
    Ok(CurrentPrices { yes, no })
  }

  async fn quote(
    &self,
    gateway: &dyn MarketGateway,
    market_maker: Address,
    outcome: Outcome,
  ) -> Result<PriceQuote> {
    let mut net = [Price::default(); 2];
    for (slot, action) in [TradeAction::Buy, TradeAction::Sell].into_iter().enumerate() {
      let raw = gateway
        .calc_net_cost(market_maker, OutcomeAmounts::unit(outcome, action))
        .await
        .with_context(|| format!("Failed to quote {action} {outcome}"))?;
      self.metrics.record_read("calc_net_cost");
      net[slot] = Price::from_fixed(raw)?;
    }

    Ok(PriceQuote {
      buy: net[0],
      sell: net[1].negated(),
    })
  }

  /// Held position size per outcome at full precision.
  #[instrument(skip(self, gateway, contracts), fields(market = %market_maker))]
  pub async fn position_balances(
    &self,
    gateway: &dyn MarketGateway,
    contracts: &ContractSet,
    market_maker: Address,
  ) -> Result<PositionBalances> {
    let owner = gateway.address();
    let mut balances = [String::new(), String::new()];

    for outcome in Outcome::ALL {
      let position_id = gateway
        .position_id(market_maker, outcome)
        .await
        .with_context(|| format!("Failed to derive {outcome} position id"))?;
      self.metrics.record_read("generate_atomic_position_id");

      let raw = gateway
        .outcome_balance(contracts.orchestrator, owner, position_id)
        .await
        .with_context(|| format!("Failed to read {outcome} position balance"))?;
      self.metrics.record_read("get_outcome_balance");

      balances[outcome.index()] = format_amount(raw);
    }

    let [yes, no] = balances;
    Ok(PositionBalances { yes, no })
  }
}
