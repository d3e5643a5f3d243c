//! Chain Adapters - EVM Node Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - Signing connection management against the configured RPC endpoint
//! - Orchestrator, market maker, collateral and ledger contract calls
//! - `AMMPriceChanged` log replay and polling

pub mod bindings;
pub mod connection;
pub mod contracts;
pub mod events;

#[cfg(test)]
mod test_node;

pub use connection::{RpcConnection, RpcConnector};
