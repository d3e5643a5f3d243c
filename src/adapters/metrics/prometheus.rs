//! Prometheus Metrics Registry - Bridge Observability
//!
//! Counts contract reads, transactions, trades and delivered price
//! ticks. Optionally exposed on `/metrics` for scraping.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Centralized Prometheus metrics for the bridge.
///
/// All metrics follow the naming convention `market_bridge_*`.
pub struct BridgeMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Read-only contract calls by operation.
    pub contract_reads: IntCounterVec,
    /// Transactions by kind and result.
    pub transactions: IntCounterVec,
    /// Trades by outcome, action and result.
    pub trades: IntCounterVec,
    /// Price ticks handed to subscriber callbacks.
    pub price_ticks: IntCounterVec,
    /// Currently running price subscriptions.
    pub active_subscriptions: IntGauge,
}

impl BridgeMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let contract_reads = IntCounterVec::new(
            Opts::new("market_bridge_contract_reads_total", "Read-only contract calls"),
            &["operation"],
        )?;

        let transactions = IntCounterVec::new(
            Opts::new("market_bridge_transactions_total", "Transactions submitted"),
            &["kind", "result"],
        )?;

        let trades = IntCounterVec::new(
            Opts::new("market_bridge_trades_total", "Trades attempted"),
            &["outcome", "action", "result"],
        )?;

        let price_ticks = IntCounterVec::new(
            Opts::new(
                "market_bridge_price_ticks_total",
                "AMMPriceChanged events delivered to callbacks",
            ),
            &["market"],
        )?;

        let active_subscriptions = IntGauge::new(
            "market_bridge_active_subscriptions",
            "Price subscriptions currently running",
        )?;

        // Register all metrics
        registry.register(Box::new(contract_reads.clone()))?;
        registry.register(Box::new(transactions.clone()))?;
        registry.register(Box::new(trades.clone()))?;
        registry.register(Box::new(price_ticks.clone()))?;
        registry.register(Box::new(active_subscriptions.clone()))?;

        Ok(Self {
            registry,
            contract_reads,
            transactions,
            trades,
            price_ticks,
            active_subscriptions,
        })
    }

    /// Count one read-only contract call.
    pub fn record_read(&self, operation: &str) {
        self.contract_reads.with_label_values(&[operation]).inc();
    }

    /// Count one confirmed or failed transaction.
    pub fn record_transaction(&self, kind: &str, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.transactions.with_label_values(&[kind, result]).inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    metrics
                        .render()
                        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_counters() {
        let metrics = BridgeMetrics::new().unwrap();
        metrics.record_read("calcNetCost");
        metrics.record_transaction("trade", false);
        metrics.active_subscriptions.inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("market_bridge_contract_reads_total{operation=\"calcNetCost\"} 1"));
        assert!(text.contains("market_bridge_transactions_total{kind=\"trade\",result=\"failure\"} 1"));
        assert!(text.contains("market_bridge_active_subscriptions 1"));
    }
}
