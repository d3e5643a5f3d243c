//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that amount conversion, price rounding
//! and trade vectors hold their invariants across random inputs.

use alloy::primitives::{I256, U256};
use proptest::prelude::*;
use rust_decimal::Decimal;

use market_bridge::domain::fixed_point::{
    format_amount, one_signed, parse_amount, to_decimal, Price, ONE,
};
use market_bridge::domain::market::{Outcome, OutcomeAmounts, TradeAction};

fn significant_digits(rendered: &str) -> usize {
    rendered
        .trim_start_matches('-')
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|c| *c == '0')
        .count()
}

// ── Price Properties ────────────────────────────────────────

proptest! {
    /// Every non-zero price below 999.5 renders exactly three significant digits.
    #[test]
    fn price_renders_three_significant_digits(
        mantissa in 1i128..999_499_999_999_999_999_999i128,
    ) {
        let raw = I256::try_from(mantissa).unwrap();
        let price = Price::from_fixed(raw).unwrap();
        let rendered = price.to_string();
        prop_assert_eq!(
            significant_digits(&rendered),
            3,
            "{} rendered as {}",
            mantissa,
            rendered
        );
    }

    /// Rounding stays within half a unit of the third significant digit.
    #[test]
    fn price_rounding_error_is_bounded(
        mantissa in 1_000_000_000_000i128..100_000_000_000_000_000_000i128,
    ) {
        let exact = to_decimal(I256::try_from(mantissa).unwrap()).unwrap();
        let rounded = Price::new(exact).value();
        let error = (rounded - exact).abs();
        // Relative error of 3 significant digits is at most 0.5%.
        prop_assert!(error <= exact * Decimal::new(5, 3));
    }

    /// Negation flips the sign and nothing else.
    #[test]
    fn price_negation_is_symmetric(
        mantissa in 1i128..1_000_000_000_000_000_000_000i128,
    ) {
        let price = Price::from_fixed(I256::try_from(mantissa).unwrap()).unwrap();
        let negated = price.negated();
        prop_assert_eq!(negated.to_string(), format!("-{price}"));
        prop_assert_eq!(negated.negated(), price);
    }
}

// ── Amount Properties ───────────────────────────────────────

proptest! {
    /// Whole-unit amounts format with a single trailing zero.
    #[test]
    fn whole_amounts_format_with_one_decimal(units in 0u64..1_000_000_000) {
        let raw = U256::from(units) * ONE;
        prop_assert_eq!(format_amount(raw), format!("{units}.0"));
    }

    /// Formatted amounts parse back to the same fixed-point value.
    #[test]
    fn formatted_amounts_parse_back(raw in any::<u128>()) {
        let amount = U256::from(raw);
        prop_assert_eq!(parse_amount(&format_amount(amount)).unwrap(), amount);
    }
}

// ── Trade Vector Properties ─────────────────────────────────

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Yes), Just(Outcome::No)]
}

fn action_strategy() -> impl Strategy<Value = TradeAction> {
    prop_oneof![Just(TradeAction::Buy), Just(TradeAction::Sell)]
}

proptest! {
    /// Exactly one slot is non-zero, and it is one whole unit.
    #[test]
    fn unit_vector_has_single_non_zero_slot(
        outcome in outcome_strategy(),
        action in action_strategy(),
    ) {
        let amounts = OutcomeAmounts::unit(outcome, action);
        let non_zero: Vec<_> = amounts.0.iter().filter(|v| !v.is_zero()).collect();
        prop_assert_eq!(non_zero.len(), 1);

        let slot = amounts.0[outcome.index()];
        prop_assert_eq!(slot.is_positive(), action == TradeAction::Buy);
        prop_assert_eq!(slot.abs(), one_signed());
    }
}
