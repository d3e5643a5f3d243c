//! Price Event Poller - `AMMPriceChanged` Log Streaming
//!
//! Replays historical `AMMPriceChanged` logs from a start block, then
//! follows new ones by polling a node-side log filter (HTTP has no
//! push). The filter is installed before the history query so no block
//! falls between the two; live logs at or below the replayed head are
//! skipped. The poller exits and uninstalls its filter as soon as the
//! receiving side is dropped.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use alloy::transports::BoxTransport;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::ports::market_gateway::PriceChangedLog;

use super::bindings::MarketMaker;

/// Consecutive failed filter polls tolerated before the stream ends.
const MAX_POLL_FAILURES: u32 = 5;

/// Start streaming price-change logs for `market_maker` into a channel.
///
/// History from `from_block` up to the current head is sent first, in
/// node order, followed by live logs. The background task stops when
/// the receiver is dropped or the filter keeps failing to poll.
#[instrument(skip(provider))]
pub async fn spawn_price_poller<P>(
    provider: P,
    market_maker: Address,
    from_block: u64,
    poll_interval: Duration,
    capacity: usize,
) -> Result<mpsc::Receiver<PriceChangedLog>>
where
    P: Provider<BoxTransport> + Clone + 'static,
{
    let filter = Filter::new()
        .address(market_maker)
        .event_signature(MarketMaker::AMMPriceChanged::SIGNATURE_HASH);

    // Install the live filter first so nothing is lost while replaying.
    let filter_id = provider
        .new_filter(&filter)
        .await
        .context("Failed to install AMMPriceChanged log filter")?;

    let history = match fetch_history(&provider, &filter, from_block).await {
        Ok(history) => history,
        Err(e) => {
            uninstall(&provider, filter_id).await;
            return Err(e);
        }
    };

    info!(
        %market_maker,
        from_block,
        head = history.head,
        replayed = history.logs.len(),
        "Price change subscription started"
    );

    let (tx, rx) = mpsc::channel(capacity);

    tokio::spawn(async move {
        stream_logs(&provider, filter_id, history, &tx, poll_interval).await;
        uninstall(&provider, filter_id).await;
        debug!(%market_maker, "Price change poller stopped");
    });

    Ok(rx)
}

/// Logs replayed before live polling starts.
struct History {
    /// Head block at subscription time.
    head: u64,
    /// First block accepted from the live filter.
    live_from: u64,
    logs: Vec<Log>,
}

async fn fetch_history<P>(provider: &P, filter: &Filter, from_block: u64) -> Result<History>
where
    P: Provider<BoxTransport>,
{
    let head = provider
        .get_block_number()
        .await
        .context("Failed to query block number")?;

    let logs = if from_block <= head {
        provider
            .get_logs(&filter.clone().from_block(from_block).to_block(head))
            .await
            .context("Failed to fetch historical AMMPriceChanged logs")?
    } else {
        Vec::new()
    };

    Ok(History {
        head,
        live_from: head.saturating_add(1).max(from_block),
        logs,
    })
}

/// Forward history, then poll the filter until the receiver goes away.
async fn stream_logs<P>(
    provider: &P,
    filter_id: U256,
    history: History,
    tx: &mpsc::Sender<PriceChangedLog>,
    poll_interval: Duration,
) where
    P: Provider<BoxTransport>,
{
    for log in &history.logs {
        if !forward(tx, log).await {
            return;
        }
    }

    let mut ticker = tokio::time::interval(poll_interval);
    let mut failures = 0;

    loop {
        tokio::select! {
            biased;

            () = tx.closed() => return,
            _ = ticker.tick() => {}
        }

        let logs = match provider.get_filter_changes::<Log>(filter_id).await {
            Ok(logs) => {
                failures = 0;
                logs
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, failures, "Log filter poll failed");
                if failures >= MAX_POLL_FAILURES {
                    warn!("Giving up on price change filter");
                    return;
                }
                continue;
            }
        };

        for log in &logs {
            if log.block_number.is_some_and(|block| block < history.live_from) {
                continue;
            }
            if !forward(tx, log).await {
                return;
            }
        }
    }
}

async fn uninstall<P>(provider: &P, filter_id: U256)
where
    P: Provider<BoxTransport>,
{
    if let Err(e) = provider.uninstall_filter(filter_id).await {
        debug!(error = %e, "Failed to uninstall log filter");
    }
}

/// Decode and send one log. Returns `false` once the receiver is gone.
async fn forward(tx: &mpsc::Sender<PriceChangedLog>, log: &Log) -> bool {
    match decode_price_changed(log) {
        Ok(event) => tx.send(event).await.is_ok(),
        Err(e) => {
            warn!(error = %e, tx_hash = ?log.transaction_hash, "Skipping undecodable price log");
            !tx.is_closed()
        }
    }
}

/// Decode an `AMMPriceChanged` log into raw fixed-point fields.
pub fn decode_price_changed(log: &Log) -> Result<PriceChangedLog> {
    let decoded = log
        .log_decode::<MarketMaker::AMMPriceChanged>()
        .context("Log is not an AMMPriceChanged event")?;
    let event = decoded.inner.data;

    debug!(block = ?log.block_number, "AMMPriceChanged decoded");

    Ok(PriceChangedLog {
        buy_yes: event.priceBuyYes,
        sell_yes: event.priceSellYes,
        buy_no: event.priceBuyNo,
        sell_no: event.priceSellNo,
        timestamp: event.timestamp,
        block_number: log.block_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{I256, LogData};
    use alloy::providers::ProviderBuilder;

    use crate::adapters::chain::test_node::FakeNode;

    fn price_log(block: u64) -> Log {
        let event = MarketMaker::AMMPriceChanged {
            priceBuyYes: I256::try_from(550_000_000_000_000_000i128).unwrap(),
            priceSellYes: I256::try_from(-450_000_000_000_000_000i128).unwrap(),
            priceBuyNo: I256::try_from(460_000_000_000_000_000i128).unwrap(),
            priceSellNo: I256::try_from(-540_000_000_000_000_000i128).unwrap(),
            timestamp: U256::from(1_700_000_000u64),
        };
        let data: LogData = event.encode_log_data();
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x11),
                data,
            },
            block_number: Some(block),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_price_changed() {
        let decoded = decode_price_changed(&price_log(42)).unwrap();
        assert_eq!(decoded.timestamp, U256::from(1_700_000_000u64));
        assert!(decoded.sell_yes.is_negative());
        assert_eq!(decoded.block_number, Some(42));
    }

    #[test]
    fn test_decode_rejects_foreign_log() {
        let mut log = price_log(1);
        log.inner.data = LogData::new_unchecked(vec![], Default::default());
        assert!(decode_price_changed(&log).is_err());
    }

    async fn next_block(rx: &mut mpsc::Receiver<PriceChangedLog>) -> Option<u64> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("price log not delivered in time")
            .expect("stream ended early")
            .block_number
    }

    #[tokio::test]
    async fn test_replay_then_live_without_duplicates() {
        // Block 5 is both the replay head and in the first filter batch.
        let node = FakeNode::builder()
            .head(5)
            .history(vec![price_log(0), price_log(2), price_log(5)])
            .changes(vec![vec![price_log(5), price_log(6)], vec![price_log(7)]])
            .start()
            .await;

        let provider = ProviderBuilder::new().on_builtin(node.url()).await.unwrap();
        let mut rx = spawn_price_poller(
            provider,
            Address::repeat_byte(0x11),
            0,
            Duration::from_millis(10),
            16,
        )
        .await
        .unwrap();

        let mut blocks = Vec::new();
        for _ in 0..5 {
            blocks.push(next_block(&mut rx).await);
        }

        assert_eq!(blocks, [0, 2, 5, 6, 7].map(Some));
        assert_eq!(node.log_queries(), vec![0]);
        assert_eq!(node.calls("eth_newFilter"), 1);

        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(extra.is_err(), "unexpected extra price log");
    }

    #[tokio::test]
    async fn test_start_block_past_head_skips_history() {
        let node = FakeNode::builder()
            .head(5)
            .history(vec![price_log(3)])
            .changes(vec![vec![price_log(6), price_log(9), price_log(10)]])
            .start()
            .await;

        let provider = ProviderBuilder::new().on_builtin(node.url()).await.unwrap();
        let mut rx = spawn_price_poller(
            provider,
            Address::repeat_byte(0x11),
            9,
            Duration::from_millis(10),
            16,
        )
        .await
        .unwrap();

        assert_eq!(next_block(&mut rx).await, Some(9));
        assert_eq!(next_block(&mut rx).await, Some(10));
        assert_eq!(node.calls("eth_getLogs"), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_polling_and_uninstalls() {
        let node = FakeNode::builder().head(1).start().await;

        let provider = ProviderBuilder::new().on_builtin(node.url()).await.unwrap();
        let rx = spawn_price_poller(
            provider,
            Address::repeat_byte(0x11),
            0,
            Duration::from_millis(10),
            16,
        )
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(node.calls("eth_getFilterChanges") > 0);

        drop(rx);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let polls = node.calls("eth_getFilterChanges");
        assert_eq!(node.calls("eth_uninstallFilter"), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(node.calls("eth_getFilterChanges"), polls);
        assert_eq!(node.calls("eth_uninstallFilter"), 1);
    }
}
