//! Market-facing domain types.
//!
//! Outcomes, trade directions, the two-slot amount vector the market
//! maker expects, and the shapes handed back to the UI.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};

use super::fixed_point::{Price, one_signed, serialize_as_number};

/// One side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// Both outcomes in slot order.
    pub const ALL: [Self; 2] = [Self::Yes, Self::No];

    /// Outcome slot index used by the market maker (Yes = 0, No = 1).
    pub const fn index(self) -> usize {
        match self {
            Self::Yes => 0,
            Self::No => 1,
        }
    }

    /// Slot index as a contract argument.
    pub fn index_u256(self) -> U256 {
        U256::from(self.index())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

impl FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => anyhow::bail!("Unknown outcome '{other}', expected Yes or No"),
        }
    }
}

/// Whether a trade buys or sells outcome tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TradeAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => anyhow::bail!("Unknown trade action '{other}', expected buy or sell"),
        }
    }
}

/// The `[yes, no]` amount vector accepted by `calcNetCost` and `trade`.
///
/// Positive magnitude buys, negative magnitude sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutcomeAmounts(pub [I256; 2]);

impl OutcomeAmounts {
    /// A single-slot vector moving `magnitude` of `outcome`.
    pub fn single(outcome: Outcome, action: TradeAction, magnitude: I256) -> Self {
        let signed = match action {
            TradeAction::Buy => magnitude,
            TradeAction::Sell => -magnitude,
        };
        let mut slots = [I256::ZERO; 2];
        slots[outcome.index()] = signed;
        Self(slots)
    }

    /// One whole unit of `outcome` in the direction of `action`.
    pub fn unit(outcome: Outcome, action: TradeAction) -> Self {
        Self::single(outcome, action, one_signed())
    }

    pub const fn yes(&self) -> I256 {
        self.0[0]
    }

    pub const fn no(&self) -> I256 {
        self.0[1]
    }

    /// Contract argument form (`int256[]`).
    pub fn to_vec(&self) -> Vec<I256> {
        self.0.to_vec()
    }
}

/// One orchestrator-tracked market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Market-maker contract address.
    pub address: Address,
    /// Project the market is about.
    pub project: String,
    /// Outcome statement being predicted.
    pub outcome: String,
}

/// Indicative buy and sell price for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    #[serde(rename = "Buy")]
    pub buy: Price,
    #[serde(rename = "Sell")]
    pub sell: Price,
}

/// Indicative prices for both outcomes of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentPrices {
    #[serde(rename = "Yes")]
    pub yes: PriceQuote,
    #[serde(rename = "No")]
    pub no: PriceQuote,
}

/// The caller's held position size per outcome, full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionBalances {
    #[serde(rename = "Yes")]
    pub yes: String,
    #[serde(rename = "No")]
    pub no: String,
}

/// One decoded `AMMPriceChanged` event.
///
/// Prices serialize as JSON numbers for charting, unlike
/// `CurrentPrices` which keeps the three-significant-digit strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    #[serde(serialize_with = "serialize_as_number")]
    pub price_buy_yes: Price,
    #[serde(serialize_with = "serialize_as_number")]
    pub price_sell_yes: Price,
    #[serde(serialize_with = "serialize_as_number")]
    pub price_buy_no: Price,
    #[serde(serialize_with = "serialize_as_number")]
    pub price_sell_no: Price,
    /// Block timestamp reported by the market maker (seconds).
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_yes_fills_first_slot() {
        let amounts = OutcomeAmounts::unit(Outcome::Yes, TradeAction::Buy);
        assert_eq!(amounts.yes(), one_signed());
        assert_eq!(amounts.no(), I256::ZERO);
    }

    #[test]
    fn test_sell_no_fills_second_slot_negative() {
        let amounts = OutcomeAmounts::unit(Outcome::No, TradeAction::Sell);
        assert_eq!(amounts.yes(), I256::ZERO);
        assert_eq!(amounts.no(), -one_signed());
    }

    #[test]
    fn test_parse_outcome_and_action_case_insensitive() {
        assert_eq!("YES".parse::<Outcome>().unwrap(), Outcome::Yes);
        assert_eq!("no".parse::<Outcome>().unwrap(), Outcome::No);
        assert_eq!("Buy".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert!("maybe".parse::<Outcome>().is_err());
        assert!("hold".parse::<TradeAction>().is_err());
    }

    #[test]
    fn test_outcome_indices() {
        assert_eq!(Outcome::Yes.index_u256(), U256::ZERO);
        assert_eq!(Outcome::No.index_u256(), U256::from(1u8));
    }

    #[test]
    fn test_current_prices_serialize_with_ui_field_names() {
        use rust_decimal_macros::dec;

        let quote = PriceQuote {
            buy: Price::new(dec!(0.5123)),
            sell: Price::new(dec!(0.48)),
        };
        let prices = CurrentPrices { yes: quote, no: quote };
        let json = serde_json::to_value(prices).unwrap();
        assert_eq!(json["Yes"]["Buy"], "0.512");
        assert_eq!(json["No"]["Sell"], "0.480");
    }

    #[test]
    fn test_price_tick_serializes_numbers() {
        use rust_decimal_macros::dec;

        let tick = PriceTick {
            price_buy_yes: Price::new(dec!(0.123)),
            price_sell_yes: Price::new(dec!(0.877)),
            price_buy_no: Price::new(dec!(0.9)),
            price_sell_no: Price::new(dec!(0.1)),
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(tick).unwrap();

        let buy_yes = json["priceBuyYes"].as_f64().expect("priceBuyYes is a number");
        assert!((buy_yes - 0.123).abs() < 1e-9);
        assert!(json["priceSellNo"].is_number());
        assert_eq!(json["timestamp"], 1_700_000_000u64);

        let quote = PriceQuote {
            buy: tick.price_buy_yes,
            sell: tick.price_sell_yes,
        };
        let prices = serde_json::to_value(CurrentPrices { yes: quote, no: quote }).unwrap();
        assert_eq!(prices["Yes"]["Buy"], "0.123");
    }
}
