//! RPC Connection - alloy-rs 0.9 Signing Provider
//!
//! Binds the device signing key to the configured JSON-RPC endpoint.
//! The resulting provider fills nonce, gas price and chain id
//! automatically and signs every transaction with the local key.
//!
//! In alloy 0.9 `Provider` is generic over its transport. The signing
//! stack is built with `on_builtin`, which boxes the transport, and
//! `RpcConnection` is generic over any `Provider<BoxTransport>` so the
//! filler type never has to be spelled out.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::BoxTransport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::config::{EventsConfig, NetworkConfig};
use crate::domain::key::SigningKey;
use crate::ports::market_gateway::{Connector, MarketGateway};

/// A provider attached to the configured node.
///
/// All contract calls in `contracts.rs` and the log poller in
/// `events.rs` go through `provider`.
pub struct RpcConnection<P> {
    /// The alloy provider; cheap to clone.
    provider: P,
    /// Address of the bound signer.
    address: Address,
    /// Interval between log filter polls.
    poll_interval: Duration,
    /// Buffered price events per subscription.
    channel_capacity: usize,
}

impl<P> RpcConnection<P>
where
    P: Provider<BoxTransport> + Clone + 'static,
{
    /// Wrap `provider` for the signer at `address`.
    ///
    /// When `network.chain_id` is configured the node's chain id is
    /// checked once here, so a misrouted endpoint fails fast.
    #[instrument(skip_all, fields(%address))]
    pub async fn open(
        provider: P,
        address: Address,
        network: &NetworkConfig,
        events: &EventsConfig,
    ) -> Result<Self> {
        if let Some(expected) = network.chain_id {
            let chain_id = provider
                .get_chain_id()
                .await
                .context("Failed to query chain ID")?;

            anyhow::ensure!(
                chain_id == expected,
                "Expected chain_id={expected}, node reports {chain_id}"
            );
        }

        info!(%address, rpc_url = %network.rpc_url, "Connected signer to RPC");

        Ok(Self {
            provider,
            address,
            poll_interval: Duration::from_millis(events.poll_interval_ms),
            channel_capacity: events.channel_capacity,
        })
    }

    /// A handle to the provider for building contract instances.
    pub fn provider(&self) -> P {
        self.provider.clone()
    }

    /// Address of the bound signer.
    pub const fn signer_address(&self) -> Address {
        self.address
    }

    pub(super) const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(super) const fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

/// `Connector` backed by the configured JSON-RPC endpoint.
pub struct RpcConnector {
    network: NetworkConfig,
    events: EventsConfig,
}

impl RpcConnector {
    pub const fn new(network: NetworkConfig, events: EventsConfig) -> Self {
        Self { network, events }
    }
}

#[async_trait]
impl Connector for RpcConnector {
    async fn connect(&self, key: &SigningKey) -> Result<Arc<dyn MarketGateway>> {
        let signer = key.signer()?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_builtin(&self.network.rpc_url)
            .await
            .with_context(|| format!("Failed to connect to {}", self.network.rpc_url))?;

        let connection = RpcConnection::open(provider, address, &self.network, &self.events).await?;
        Ok(Arc::new(connection))
    }
}
