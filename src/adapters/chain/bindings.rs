//! Contract Bindings - Solidity Interfaces for alloy `sol!`
//!
//! Only the functions and events the bridge actually calls are
//! declared. Selectors and the event topic are derived from these
//! signatures, so they must match the deployed contracts exactly.

use alloy::sol;

sol! {
    /// Top-level contract tracking markets and per-user outcome balances.
    #[sol(rpc)]
    interface Orchestrator {
        function collateralToken() external view returns (address);
        function conditionalTokens() external view returns (address);
        function getMarketsCount() external view returns (uint256);
        function getMarketDetails(uint256 index) external view returns (address, string, string);
        function getOutcomeBalance(address owner, uint256 positionId) external view returns (uint256);
    }
}

sol! {
    /// Per-market automated market maker for a Yes/No outcome pair.
    #[sol(rpc)]
    interface MarketMaker {
        event AMMPriceChanged(
            int256 priceBuyYes,
            int256 priceSellYes,
            int256 priceBuyNo,
            int256 priceSellNo,
            uint256 timestamp
        );

        function calcNetCost(int256[] outcomeTokenAmounts) external view returns (int256);
        function trade(int256[] outcomeTokenAmounts, int256 collateralLimit) external returns (int256);
        function generateAtomicPositionId(uint256 outcomeIndex) external view returns (uint256);
    }
}

sol! {
    /// ERC-20 collateral token.
    #[sol(rpc)]
    interface CollateralToken {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    /// ERC-1155 conditional-token ledger.
    #[sol(rpc)]
    interface ConditionalTokens {
        function setApprovalForAll(address operator, bool approved) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn test_erc20_selectors_match_standard() {
        assert_eq!(CollateralToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(CollateralToken::allowanceCall::SELECTOR, [0xdd, 0x62, 0xed, 0x3e]);
        assert_eq!(CollateralToken::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn test_set_approval_for_all_selector() {
        assert_eq!(
            ConditionalTokens::setApprovalForAllCall::SELECTOR,
            [0xa2, 0x2c, 0xb4, 0x65]
        );
    }

    #[test]
    fn test_price_changed_topic() {
        assert_eq!(
            MarketMaker::AMMPriceChanged::SIGNATURE_HASH,
            keccak256("AMMPriceChanged(int256,int256,int256,int256,uint256)")
        );
    }

    #[test]
    fn test_trade_selector_uses_dynamic_int_array() {
        let expected = &keccak256("trade(int256[],int256)")[..4];
        assert_eq!(&MarketMaker::tradeCall::SELECTOR[..], expected);
    }
}
