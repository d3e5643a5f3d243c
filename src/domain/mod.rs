//! Domain layer - Core types and conversions.
//!
//! Pure types shared by ports, adapters and use cases: the device key,
//! market shapes, and the 18-decimal fixed-point conversions. Nothing in
//! here performs I/O (hexagonal architecture inner ring).

pub mod fixed_point;
pub mod key;
pub mod market;

// Re-export core types for convenience
pub use fixed_point::Price;
pub use key::{SigningKey, WalletHandle};
pub use market::{
    CurrentPrices, Market, Outcome, OutcomeAmounts, PositionBalances, PriceQuote, PriceTick,
    TradeAction,
};
