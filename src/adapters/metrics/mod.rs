//! Metrics Adapters - Prometheus Export
//!
//! Counters for contract reads, transactions, trades and price ticks,
//! plus an optional `/metrics` HTTP endpoint.

pub mod prometheus;

pub use self::prometheus::BridgeMetrics;
