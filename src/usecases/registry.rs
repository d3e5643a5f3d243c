//! Contract Registry - Single-flight Address Resolution
//!
//! Resolves the collateral token and conditional-token ledger from the
//! configured orchestrator exactly once. Concurrent first callers wait
//! on the same initialization instead of each querying the chain; a
//! failed initialization leaves the registry empty so the next caller
//! retries.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::ports::market_gateway::MarketGateway;

/// The resolved contract addresses, fixed for the registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractSet {
  /// Orchestrator (configured).
  pub orchestrator: Address,
  /// ERC-20 collateral token (read from the orchestrator).
  pub collateral: Address,
  /// Conditional-token ledger (read from the orchestrator).
  pub conditional_tokens: Address,
}

/// Write-once registry of contract addresses.
pub struct ContractRegistry {
  orchestrator: Address,
  contracts: OnceCell<ContractSet>,
}

impl ContractRegistry {
  pub const fn new(orchestrator: Address) -> Self {
    Self {
      orchestrator,
      contracts: OnceCell::const_new(),
    }
  }

  /// The resolved set, if initialization already completed.
  pub fn contracts(&self) -> Option<&ContractSet> {
    self.contracts.get()
  }

  /// Resolve the contract set once and return the cached value after.
  #[instrument(skip(self, gateway), fields(orchestrator = %self.orchestrator))]
  pub async fn ensure_initialized(&self, gateway: &dyn MarketGateway) -> Result<&ContractSet> {
    self.contracts
      .get_or_try_init(|| async {
        let collateral = gateway
          .collateral_token(self.orchestrator)
          .await
          .context("Failed to resolve collateral token")?;
        let conditional_tokens = gateway
          .conditional_tokens(self.orchestrator)
          .await
          .context("Failed to resolve conditional-token ledger")?;

        info!(%collateral, %conditional_tokens, "Contract registry initialized");

        Ok(ContractSet {
          orchestrator: self.orchestrator,
          collateral,
          conditional_tokens,
        })
      })
      .await
  }
}
