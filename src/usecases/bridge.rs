//! Market Bridge - Caller-facing Facade
//!
//! The single entry point the UI talks to. Lazily opens the signing
//! connection with the device key, resolves the contract registry on
//! first use, and routes each request to the matching use case.
//!
//! Callers never see raw fixed-point values or node errors from
//! `trade`; every other entry point propagates errors with context.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{instrument, warn};

use crate::adapters::chain::RpcConnector;
use crate::adapters::metrics::BridgeMetrics;
use crate::adapters::persistence::FileKeyStore;
use crate::config::AppConfig;
use crate::domain::key::WalletHandle;
use crate::domain::market::{
  CurrentPrices, Market, Outcome, PositionBalances, PriceTick, TradeAction,
};
use crate::ports::key_store::KeyStore;
use crate::ports::market_gateway::{Connector, MarketGateway};
use crate::usecases::price_feed::{PriceFeed, PriceSubscription};
use crate::usecases::queries::MarketQueries;
use crate::usecases::registry::{ContractRegistry, ContractSet};
use crate::usecases::trade_executor::{TradeError, TradeExecutor, TradeReceipt, TradeSettings};
use crate::usecases::wallet::WalletManager;

/// Static settings the bridge needs besides its ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
  /// Configured orchestrator address.
  pub orchestrator: Address,
  /// Trade transaction parameters.
  pub trade: TradeSettings,
  /// First block replayed for new price subscriptions.
  pub replay_from_block: u64,
}

impl BridgeSettings {
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    Ok(Self {
      orchestrator: config.contracts.orchestrator_address()?,
      trade: TradeSettings::from_config(&config.trading)?,
      replay_from_block: config.events.replay_from_block,
    })
  }
}

/// Facade over wallet, registry, queries, price feed and trading.
pub struct MarketBridge<K: KeyStore, C: Connector> {
  wallet: WalletManager<K>,
  connector: Arc<C>,
  /// Signing connection, opened on first use.
  gateway: OnceCell<Arc<dyn MarketGateway>>,
  registry: ContractRegistry,
  queries: MarketQueries,
  feed: PriceFeed,
  executor: TradeExecutor,
}

impl MarketBridge<FileKeyStore, RpcConnector> {
  /// Wire the bridge against the configured key file and RPC node.
  pub fn from_config(config: &AppConfig, metrics: Arc<BridgeMetrics>) -> Result<Self> {
    let settings = BridgeSettings::from_config(config)?;
    let key_store = Arc::new(FileKeyStore::new(config.keystore.path.clone()));
    let connector = Arc::new(RpcConnector::new(
      config.network.clone(),
      config.events.clone(),
    ));
    Ok(Self::new(key_store, connector, settings, metrics))
  }
}

impl<K: KeyStore, C: Connector> MarketBridge<K, C> {
  pub fn new(
    key_store: Arc<K>,
    connector: Arc<C>,
    settings: BridgeSettings,
    metrics: Arc<BridgeMetrics>,
  ) -> Self {
    Self {
      wallet: WalletManager::new(key_store),
      connector,
      gateway: OnceCell::new(),
      registry: ContractRegistry::new(settings.orchestrator),
      queries: MarketQueries::new(Arc::clone(&metrics)),
      feed: PriceFeed::new(settings.replay_from_block, Arc::clone(&metrics)),
      executor: TradeExecutor::new(settings.trade, metrics),
    }
  }

  /// The device wallet, creating its key on first use.
  pub async fn wallet(&self) -> Result<WalletHandle> {
    self.wallet.wallet().await
  }

  /// Collateral balance of the device wallet.
  pub async fn balance(&self) -> Result<String> {
    let (gateway, contracts) = self.connected().await?;
    self.queries.balance(gateway.as_ref(), contracts).await
  }

  /// All markets in orchestrator index order.
  pub async fn markets(&self) -> Result<Vec<Market>> {
    let (gateway, contracts) = self.connected().await?;
    self.queries.markets(gateway.as_ref(), contracts).await
  }

  /// Subscribe `callback` to `AMMPriceChanged` events of `market_maker`.
  pub async fn listen_on_price_changes<F>(
    &self,
    market_maker: Address,
    callback: F,
  ) -> Result<PriceSubscription>
  where
    F: FnMut(PriceTick) + Send + 'static,
  {
    let gateway = self.gateway().await?;
    self
      .feed
      .subscribe(gateway.as_ref(), market_maker, callback)
      .await
  }

  /// Indicative buy and sell prices for both outcomes.
  pub async fn current_prices(&self, market_maker: Address) -> Result<CurrentPrices> {
    let gateway = self.gateway().await?;
    self
      .queries
      .current_prices(gateway.as_ref(), market_maker)
      .await
  }

  /// The device wallet's held position per outcome.
  pub async fn position_balances(&self, market_maker: Address) -> Result<PositionBalances> {
    let (gateway, contracts) = self.connected().await?;
    self
      .queries
      .position_balances(gateway.as_ref(), contracts, market_maker)
      .await
  }

  /// Buy or sell one unit and report only whether it succeeded.
  ///
  /// Every failure is logged and collapsed into `false`.
  pub async fn trade(&self, market_maker: Address, outcome: Outcome, action: TradeAction) -> bool {
    match self.execute_trade(market_maker, outcome, action).await {
      Ok(_) => true,
      Err(e) => {
        warn!(market = %market_maker, %outcome, %action, error = %e, "Trade failed");
        false
      }
    }
  }

  /// Buy or sell one unit, returning the receipt or a typed failure.
  #[instrument(skip(self), fields(market = %market_maker))]
  pub async fn execute_trade(
    &self,
    market_maker: Address,
    outcome: Outcome,
    action: TradeAction,
  ) -> Result<TradeReceipt, TradeError> {
    let (gateway, contracts) = self.connected().await.map_err(TradeError::Transport)?;
    self
      .executor
      .execute(gateway.as_ref(), contracts, market_maker, outcome, action)
      .await
  }

  /// Resolved contract addresses, once initialized.
  pub fn contracts(&self) -> Option<&ContractSet> {
    self.registry.contracts()
  }

  async fn gateway(&self) -> Result<&Arc<dyn MarketGateway>> {
    self
      .gateway
      .get_or_try_init(|| async {
        let key = self.wallet.get_or_create_key().await?;
        self
          .connector
          .connect(&key)
          .await
          .context("Failed to open signing connection")
      })
      .await
  }

  async fn connected(&self) -> Result<(&Arc<dyn MarketGateway>, &ContractSet)> {
    let gateway = self.gateway().await?;
    let contracts = self.registry.ensure_initialized(gateway.as_ref()).await?;
    Ok((gateway, contracts))
  }
}
