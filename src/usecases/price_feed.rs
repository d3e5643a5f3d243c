//! Price Feed - `AMMPriceChanged` Subscriptions
//!
//! Replays a market maker's price history from the configured block and
//! then follows new events, handing each decoded tick to a caller
//! callback in emission order. Each subscription runs in its own task
//! and lives until `unsubscribe` is called or the event stream ends.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::BridgeMetrics;
use crate::domain::fixed_point::Price;
use crate::domain::market::PriceTick;
use crate::ports::market_gateway::{MarketGateway, PriceChangedLog};

/// Decode the raw event fields into a tick of rounded prices.
///
/// Sell-side values are negated so they read as positive proceeds.
pub fn tick_from_log(log: &PriceChangedLog) -> Result<PriceTick> {
  Ok(PriceTick {
    price_buy_yes: Price::from_fixed(log.buy_yes)?,
    price_sell_yes: Price::from_fixed(log.sell_yes)?.negated(),
    price_buy_no: Price::from_fixed(log.buy_no)?,
    price_sell_no: Price::from_fixed(log.sell_no)?.negated(),
    timestamp: log.timestamp.saturating_to::<u64>(),
  })
}

/// Starts price subscriptions against a gateway.
pub struct PriceFeed {
  /// First block replayed for every new subscription.
  replay_from_block: u64,
  metrics: Arc<BridgeMetrics>,
}

impl PriceFeed {
  pub fn new(replay_from_block: u64, metrics: Arc<BridgeMetrics>) -> Self {
    Self {
      replay_from_block,
      metrics,
    }
  }

  /// Subscribe `callback` to price changes of `market_maker`.
  ///
  /// Returns once the log filter is installed. Each call creates an
  /// independent subscription, so subscribing twice delivers every
  /// event twice.
  #[instrument(skip(self, gateway, callback), fields(market = %market_maker))]
  pub async fn subscribe<F>(
    &self,
    gateway: &dyn MarketGateway,
    market_maker: Address,
    callback: F,
  ) -> Result<PriceSubscription>
  where
    F: FnMut(PriceTick) + Send + 'static,
  {
    let events = gateway
      .price_changes(market_maker, self.replay_from_block)
      .await
      .context("Failed to subscribe to AMMPriceChanged")?;

    let id = Uuid::new_v4();
    let stop = Arc::new(Notify::new());

    self.metrics.active_subscriptions.inc();
    info!(
      subscription = %id,
      from_block = self.replay_from_block,
      "Price subscription started"
    );

    let handle = tokio::spawn(pump(
      id,
      market_maker,
      events,
      callback,
      Arc::clone(&stop),
      Arc::clone(&self.metrics),
    ));

    Ok(PriceSubscription {
      id,
      market_maker,
      stop,
      handle,
    })
  }
}

async fn pump<F>(
  id: Uuid,
  market_maker: Address,
  mut events: mpsc::Receiver<PriceChangedLog>,
  mut callback: F,
  stop: Arc<Notify>,
  metrics: Arc<BridgeMetrics>,
) where
  F: FnMut(PriceTick) + Send + 'static,
{
  let market_label = market_maker.to_string();

  loop {
    tokio::select! {
      biased;

      () = stop.notified() => {
        debug!(subscription = %id, "Price subscription cancelled");
        break;
      }

      next = events.recv() => {
        let Some(log) = next else {
          warn!(subscription = %id, "Price event stream ended");
          break;
        };
        match tick_from_log(&log) {
          Ok(tick) => {
            metrics.price_ticks.with_label_values(&[&market_label]).inc();
            callback(tick);
          }
          Err(e) => {
            warn!(subscription = %id, block = ?log.block_number, error = %e, "Skipping undecodable price event");
          }
        }
      }
    }
  }

  metrics.active_subscriptions.dec();
}

/// Handle to a running price subscription.
///
/// Dropping the handle leaves the subscription running; call
/// [`PriceSubscription::unsubscribe`] to stop it.
#[derive(Debug)]
pub struct PriceSubscription {
  id: Uuid,
  market_maker: Address,
  stop: Arc<Notify>,
  handle: JoinHandle<()>,
}

impl PriceSubscription {
  pub const fn id(&self) -> Uuid {
    self.id
  }

  pub const fn market_maker(&self) -> Address {
    self.market_maker
  }

  /// Whether events are still being delivered.
  pub fn is_active(&self) -> bool {
    !self.handle.is_finished()
  }

  /// Stop delivery and wait for the subscription task to exit.
  ///
  /// No callback runs after this returns.
  pub async fn unsubscribe(self) {
    self.stop.notify_one();
    if let Err(e) = self.handle.await {
      warn!(subscription = %self.id, error = %e, "Price subscription task failed");
    }
    info!(subscription = %self.id, "Price subscription stopped");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixed_point::parse_signed_amount;
  use alloy::primitives::U256;

  fn raw(value: &str) -> alloy::primitives::I256 {
    parse_signed_amount(value).unwrap()
  }

  #[test]
  fn test_tick_negates_sell_prices() {
    let log = PriceChangedLog {
      buy_yes: raw("0.51234"),
      sell_yes: raw("-0.2"),
      buy_no: raw("0.5"),
      sell_no: raw("-0.48765"),
      timestamp: U256::from(1_700_000_000u64),
      block_number: Some(7),
    };

    let tick = tick_from_log(&log).unwrap();
    assert_eq!(tick.price_buy_yes.to_string(), "0.512");
    assert_eq!(tick.price_sell_yes.to_string(), "0.200");
    assert_eq!(tick.price_buy_no.to_string(), "0.500");
    assert_eq!(tick.price_sell_no.to_string(), "0.488");
    assert_eq!(tick.timestamp, 1_700_000_000);
  }

  #[test]
  fn test_oversized_timestamp_saturates() {
    let log = PriceChangedLog {
      buy_yes: raw("0.5"),
      sell_yes: raw("-0.5"),
      buy_no: raw("0.5"),
      sell_no: raw("-0.5"),
      timestamp: U256::MAX,
      block_number: None,
    };

    assert_eq!(tick_from_log(&log).unwrap().timestamp, u64::MAX);
  }
}
