//! Contract Interactions - Orchestrator, Market Maker, Tokens
//!
//! Implements the `MarketGateway` port on top of an `RpcConnection`
//! using the `sol!` bindings. Views are plain `eth_call`s; state
//! changing calls are signed locally, sent, and awaited until their
//! receipt is available.

use alloy::network::ReceiptResponse as _;
use alloy::primitives::{Address, I256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolCall;
use alloy::transports::BoxTransport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::domain::market::{Market, Outcome, OutcomeAmounts};
use crate::ports::market_gateway::{MarketGateway, PriceChangedLog, TxOutcome};

use super::bindings::{CollateralToken, ConditionalTokens, MarketMaker, Orchestrator};
use super::connection::RpcConnection;
use super::events;

/// Summarize a mined receipt and log the result.
fn confirmed(label: &'static str, receipt: &TransactionReceipt) -> TxOutcome {
    let outcome = TxOutcome {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
        block_number: receipt.block_number,
    };

    info!(
        tx = label,
        tx_hash = %outcome.tx_hash,
        success = outcome.success,
        block = ?outcome.block_number,
        "Transaction confirmed"
    );

    outcome
}

#[async_trait]
impl<P> MarketGateway for RpcConnection<P>
where
    P: Provider<BoxTransport> + Clone + 'static,
{
    fn address(&self) -> Address {
        self.signer_address()
    }

    #[instrument(skip(self))]
    async fn collateral_token(&self, orchestrator: Address) -> Result<Address> {
        let contract = Orchestrator::new(orchestrator, self.provider());
        let Orchestrator::collateralTokenReturn { _0: token } = contract
            .collateralToken()
            .call()
            .await
            .context("collateralToken() call failed")?;
        Ok(token)
    }

    #[instrument(skip(self))]
    async fn conditional_tokens(&self, orchestrator: Address) -> Result<Address> {
        let contract = Orchestrator::new(orchestrator, self.provider());
        let Orchestrator::conditionalTokensReturn { _0: ledger } = contract
            .conditionalTokens()
            .call()
            .await
            .context("conditionalTokens() call failed")?;
        Ok(ledger)
    }

    #[instrument(skip(self))]
    async fn markets_count(&self, orchestrator: Address) -> Result<u64> {
        let contract = Orchestrator::new(orchestrator, self.provider());
        let Orchestrator::getMarketsCountReturn { _0: count } = contract
            .getMarketsCount()
            .call()
            .await
            .context("getMarketsCount() call failed")?;
        u64::try_from(count).context("Market count does not fit in u64")
    }

    #[instrument(skip(self))]
    async fn market_details(&self, orchestrator: Address, index: u64) -> Result<Market> {
        let contract = Orchestrator::new(orchestrator, self.provider());
        let details = contract
            .getMarketDetails(U256::from(index))
            .call()
            .await
            .with_context(|| format!("getMarketDetails({index}) call failed"))?;

        debug!(index, address = %details._0, "Market details fetched");

        Ok(Market {
            address: details._0,
            project: details._1,
            outcome: details._2,
        })
    }

    #[instrument(skip(self))]
    async fn outcome_balance(
        &self,
        orchestrator: Address,
        owner: Address,
        position_id: U256,
    ) -> Result<U256> {
        let contract = Orchestrator::new(orchestrator, self.provider());
        let Orchestrator::getOutcomeBalanceReturn { _0: balance } = contract
            .getOutcomeBalance(owner, position_id)
            .call()
            .await
            .context("getOutcomeBalance() call failed")?;
        Ok(balance)
    }

    #[instrument(skip(self), fields(yes = %amounts.yes(), no = %amounts.no()))]
    async fn calc_net_cost(&self, market_maker: Address, amounts: OutcomeAmounts) -> Result<I256> {
        let contract = MarketMaker::new(market_maker, self.provider());
        let MarketMaker::calcNetCostReturn { _0: cost } = contract
            .calcNetCost(amounts.to_vec())
            .call()
            .await
            .context("calcNetCost() call failed")?;
        Ok(cost)
    }

    #[instrument(skip(self))]
    async fn position_id(&self, market_maker: Address, outcome: Outcome) -> Result<U256> {
        let contract = MarketMaker::new(market_maker, self.provider());
        let MarketMaker::generateAtomicPositionIdReturn { _0: id } = contract
            .generateAtomicPositionId(outcome.index_u256())
            .call()
            .await
            .with_context(|| format!("generateAtomicPositionId({}) call failed", outcome.index()))?;
        Ok(id)
    }

    #[instrument(skip(self), fields(yes = %amounts.yes(), no = %amounts.no()))]
    async fn trade(
        &self,
        market_maker: Address,
        amounts: OutcomeAmounts,
        collateral_limit: I256,
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        let contract = MarketMaker::new(market_maker, self.provider());
        let label = MarketMaker::tradeCall::SIGNATURE;
        let pending = contract
            .trade(amounts.to_vec(), collateral_limit)
            .gas(gas_limit)
            .send()
            .await
            .context("Failed to send trade transaction")?;

        let tx_hash = *pending.tx_hash();
        info!(tx = label, %tx_hash, "Transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("Failed to confirm trade transaction {tx_hash}"))?;
        Ok(confirmed(label, &receipt))
    }

    #[instrument(skip(self))]
    async fn price_changes(
        &self,
        market_maker: Address,
        from_block: u64,
    ) -> Result<mpsc::Receiver<PriceChangedLog>> {
        events::spawn_price_poller(
            self.provider(),
            market_maker,
            from_block,
            self.poll_interval(),
            self.channel_capacity(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let contract = CollateralToken::new(token, self.provider());
        let CollateralToken::balanceOfReturn { _0: balance } = contract
            .balanceOf(owner)
            .call()
            .await
            .context("balanceOf() call failed")?;
        Ok(balance)
    }

    #[instrument(skip(self))]
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let contract = CollateralToken::new(token, self.provider());
        let CollateralToken::allowanceReturn { _0: allowance } = contract
            .allowance(owner, spender)
            .call()
            .await
            .context("allowance() call failed")?;
        Ok(allowance)
    }

    #[instrument(skip(self))]
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        let contract = CollateralToken::new(token, self.provider());
        let label = CollateralToken::approveCall::SIGNATURE;
        let pending = contract
            .approve(spender, amount)
            .gas(gas_limit)
            .send()
            .await
            .context("Failed to send approve transaction")?;

        let tx_hash = *pending.tx_hash();
        info!(tx = label, %tx_hash, "Transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("Failed to confirm approve transaction {tx_hash}"))?;
        Ok(confirmed(label, &receipt))
    }

    #[instrument(skip(self))]
    async fn set_approval_for_all(
        &self,
        ledger: Address,
        operator: Address,
        approved: bool,
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        let contract = ConditionalTokens::new(ledger, self.provider());
        let label = ConditionalTokens::setApprovalForAllCall::SIGNATURE;
        let pending = contract
            .setApprovalForAll(operator, approved)
            .gas(gas_limit)
            .send()
            .await
            .context("Failed to send setApprovalForAll transaction")?;

        let tx_hash = *pending.tx_hash();
        info!(tx = label, %tx_hash, "Transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("Failed to confirm setApprovalForAll transaction {tx_hash}"))?;
        Ok(confirmed(label, &receipt))
    }
}
