//! Fixed-point amount conversion.
//!
//! Every amount that crosses the contract boundary is an integer scaled
//! by 10^18. Balances go back to callers at full precision in the
//! familiar `formatEther` shape; prices are rounded to three significant
//! digits.
//!
//! Decimal math uses `rust_decimal` so that rounding is exact and never
//! depends on binary float representation.

use std::fmt;

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{I256, U256};
use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use serde::{Serialize, Serializer};

/// Number of decimals carried by every contract-side amount.
pub const DECIMALS: u32 = 18;

/// One whole unit (10^18) as an unsigned contract amount.
pub const ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// One whole unit as a signed contract amount.
pub fn one_signed() -> I256 {
    I256::from_raw(ONE)
}

/// Format an unsigned fixed-point amount at full precision.
///
/// Trailing zeros are trimmed but at least one fractional digit is
/// kept, so `100 * 10^18` renders as `"100.0"`.
pub fn format_amount(amount: U256) -> String {
    trim_fraction(&format_ether(amount))
}

/// Parse a decimal string (`"100"`, `"0.5"`) into a fixed-point amount.
pub fn parse_amount(value: &str) -> Result<U256> {
    parse_ether(value.trim()).with_context(|| format!("Invalid decimal amount: {value}"))
}

/// Parse a possibly negative decimal string into a signed fixed-point amount.
pub fn parse_signed_amount(value: &str) -> Result<I256> {
    let value = value.trim();
    let (negative, magnitude) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let magnitude = I256::try_from(parse_amount(magnitude)?)
        .map_err(|_| anyhow::anyhow!("Amount {value} exceeds int256 range"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Convert a signed fixed-point amount into an exact `Decimal`.
pub fn to_decimal(raw: I256) -> Result<Decimal> {
    let mantissa = i128::try_from(raw)
        .map_err(|_| anyhow::anyhow!("Fixed-point value {raw} does not fit in i128"))?;
    Decimal::try_from_i128_with_scale(mantissa, DECIMALS)
        .with_context(|| format!("Fixed-point value {raw} exceeds decimal range"))
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{int}.0")
            } else {
                format!("{int}.{frac}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

/// A price rounded to three significant digits.
///
/// `Display` always renders exactly three significant digits
/// (`0.123`, `-0.200`, `1.50`), mirroring how the UI shows quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Significant digits kept after rounding.
    pub const SIGNIFICANT_DIGITS: u32 = 3;

    /// Round a decimal to three significant digits (half away from zero).
    pub fn new(value: Decimal) -> Self {
        if value.is_zero() {
            return Self(Decimal::ZERO);
        }
        let rounded = value
            .round_sf_with_strategy(Self::SIGNIFICANT_DIGITS, RoundingStrategy::MidpointAwayFromZero)
            .unwrap_or(value);
        Self(rounded)
    }

    /// Convert a raw fixed-point contract value into a rounded price.
    pub fn from_fixed(raw: I256) -> Result<Self> {
        Ok(Self::new(to_decimal(raw)?))
    }

    /// The same price with its sign flipped.
    #[must_use]
    pub fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Exact rounded value.
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Lossy float view for charting.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Decimal places needed to show three significant digits.
    fn display_places(&self) -> usize {
        if self.0.is_zero() {
            return (Self::SIGNIFICANT_DIGITS - 1) as usize;
        }
        let exponent = magnitude(self.0.abs());
        let places = i64::from(Self::SIGNIFICANT_DIGITS) - 1 - exponent;
        usize::try_from(places.max(0)).unwrap_or(0)
    }
}

/// `floor(log10(value))` for a positive decimal.
fn magnitude(value: Decimal) -> i64 {
    let mut v = value;
    let mut exponent = 0;
    if v >= Decimal::ONE {
        while v >= Decimal::TEN {
            v /= Decimal::TEN;
            exponent += 1;
        }
    } else {
        while v < Decimal::ONE {
            v *= Decimal::TEN;
            exponent -= 1;
        }
    }
    exponent
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.display_places(), self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `serialize_with` helper emitting a price as a JSON number.
pub fn serialize_as_number<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(price.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixed(value: &str) -> I256 {
        I256::from_raw(parse_amount(value).unwrap())
    }

    #[test]
    fn test_one_is_ten_to_the_eighteenth() {
        assert_eq!(ONE, U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(one_signed(), I256::try_from(1_000_000_000_000_000_000i128).unwrap());
    }

    #[test]
    fn test_price_keeps_three_significant_digits() {
        let price = Price::from_fixed(fixed("0.12345")).unwrap();
        assert_eq!(price.to_string(), "0.123");
        assert_eq!(price.value(), dec!(0.123));
    }

    #[test]
    fn test_sell_leg_negation_pads_zeros() {
        let price = Price::from_fixed(fixed("0.2")).unwrap().negated();
        assert_eq!(price.to_string(), "-0.200");
    }

    #[test]
    fn test_price_rounds_half_away_from_zero() {
        assert_eq!(Price::new(dec!(0.1235)).to_string(), "0.124");
        assert_eq!(Price::new(dec!(-0.1235)).to_string(), "-0.124");
        assert_eq!(Price::new(dec!(0.99961)).to_string(), "1.00");
    }

    #[test]
    fn test_price_display_above_one_and_zero() {
        assert_eq!(Price::new(dec!(1.5)).to_string(), "1.50");
        assert_eq!(Price::new(dec!(12.345)).to_string(), "12.3");
        assert_eq!(Price::new(Decimal::ZERO).to_string(), "0.00");
    }

    #[test]
    fn test_small_prices_keep_leading_zeros() {
        assert_eq!(Price::new(dec!(0.0012345)).to_string(), "0.00123");
    }

    #[test]
    fn test_format_amount_trims_like_format_ether() {
        assert_eq!(format_amount(ONE * U256::from(100u64)), "100.0");
        assert_eq!(format_amount(ONE / U256::from(2u64)), "0.5");
        assert_eq!(format_amount(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(format_amount(U256::ZERO), "0.0");
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_amount(" 100 ").unwrap(), ONE * U256::from(100u64));
    }

    #[test]
    fn test_parse_signed_amount() {
        assert_eq!(parse_signed_amount("0").unwrap(), I256::ZERO);
        assert_eq!(parse_signed_amount("-1").unwrap(), -one_signed());
        assert_eq!(parse_signed_amount("1").unwrap(), one_signed());
    }

    #[test]
    fn test_to_decimal_handles_negative_values() {
        assert_eq!(to_decimal(-one_signed()).unwrap(), dec!(-1));
    }
}
