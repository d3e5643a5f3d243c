//! Market Bridge - Library Root
//!
//! Client-side bridge to the prediction-market contracts. Re-exports
//! all modules for the CLI and integration tests.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
