//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use-case layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `KeyStore`: Device signing-key persistence
//! - `MarketGateway` / `Connector`: Contract calls over a signing connection

pub mod key_store;
pub mod market_gateway;
