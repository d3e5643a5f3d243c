//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! bridge's caller-facing operations. Each use case is a self-contained
//! operation; `MarketBridge` wires them together.
//!
//! Use cases:
//! - `WalletManager`: Device key creation and wallet handles
//! - `ContractRegistry`: Single-flight contract address resolution
//! - `MarketQueries`: Balance, market listing, prices, positions
//! - `PriceFeed`: `AMMPriceChanged` subscriptions
//! - `TradeExecutor`: One-unit trades with approval bootstrap
//! - `MarketBridge`: Facade over all of the above

pub mod bridge;
pub mod price_feed;
pub mod queries;
pub mod registry;
pub mod trade_executor;
pub mod wallet;

pub use bridge::{BridgeSettings, MarketBridge};
pub use price_feed::PriceSubscription;
pub use trade_executor::{TradeError, TradeReceipt, TradeSettings};
