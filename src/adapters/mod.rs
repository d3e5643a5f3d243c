//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (blockchain RPC, file I/O, metrics export).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `chain`: EVM node interaction via alloy-rs
//! - `metrics`: Prometheus metrics export
//! - `persistence`: JSON signing-key file

pub mod chain;
pub mod metrics;
pub mod persistence;
