//! Router call builder
//!
//! Builds the ERC-20 and router `ContractCall`s the orchestrators submit.
//! Function names and argument order are wire-compatible with the deployed
//! contracts; integer arguments travel as decimal strings.

use std::time::{SystemTime, UNIX_EPOCH};

use evm_client::ContractCall;
use tidepool_core::types::constants::DEADLINE_WINDOW_SECS;
use tidepool_core::{Address, Amount, TokenRef};

use crate::state::AmmError;

/// ABI function names
pub mod abi {
    pub const APPROVE: &str = "approve";
    pub const ALLOWANCE: &str = "allowance";
    pub const BALANCE_OF: &str = "balanceOf";
    pub const SWAP_EXACT_TOKENS_FOR_TOKENS: &str = "swapExactTokensForTokens";
    pub const ADD_LIQUIDITY: &str = "addLiquidity";
    pub const ADD_LIQUIDITY_ETH: &str = "addLiquidityETH";
    pub const REMOVE_LIQUIDITY: &str = "removeLiquidity";
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// On-chain deadline: `now + 1200` seconds, recomputed per operation at
/// execution time so a stale preview can never extend it.
pub fn deadline_from(now_unix: u64) -> u64 {
    now_unix + DEADLINE_WINDOW_SECS
}

// =============================================================================
// ERC-20 calls
// =============================================================================

/// allowance(owner, spender) read
pub fn allowance_read(token: &TokenRef, owner: &Address, spender: &Address) -> ContractCall {
    ContractCall::new(token.address.clone(), abi::ALLOWANCE)
        .address(owner)
        .address(spender)
}

/// balanceOf(owner) read
pub fn balance_read(token: &TokenRef, owner: &Address) -> ContractCall {
    ContractCall::new(token.address.clone(), abi::BALANCE_OF).address(owner)
}

/// approve(spender, amount)
pub fn approve(token: &TokenRef, spender: &Address, amount: Amount) -> ContractCall {
    ContractCall::new(token.address.clone(), abi::APPROVE)
        .address(spender)
        .uint(amount)
}

// =============================================================================
// Router calls
// =============================================================================

/// swapExactTokensForTokens(amountIn, amountOutMin, path[2], to, deadline)
#[allow(clippy::too_many_arguments)]
pub fn swap_exact_tokens(
    router: &Address,
    token_in: &TokenRef,
    token_out: &TokenRef,
    amount_in: Amount,
    amount_out_min: Amount,
    recipient: &Address,
    deadline: u64,
) -> ContractCall {
    ContractCall::new(router.clone(), abi::SWAP_EXACT_TOKENS_FOR_TOKENS)
        .uint(amount_in)
        .uint(amount_out_min)
        .address_array(&[&token_in.address, &token_out.address])
        .address(recipient)
        .uint(deadline as Amount)
}

/// Which router entry point a liquidity operation uses.
///
/// Decided once per operation from the two token addresses; never
/// re-evaluated mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityEntry {
    /// Both legs are plain ERC-20s
    Erc20Only,
    /// One leg is the wrapped native asset and rides as call value
    EthPaired { eth_is_a: bool },
}

/// Select the liquidity entry point for a token pair
pub fn select_liquidity_entry(
    token_a: &TokenRef,
    token_b: &TokenRef,
    weth: &Address,
) -> Result<LiquidityEntry, AmmError> {
    if token_a.is_same(token_b) {
        return Err(AmmError::BuildError(
            "liquidity pair must contain two distinct tokens".to_string(),
        ));
    }
    match (token_a.has_address(weth.as_str()), token_b.has_address(weth.as_str())) {
        (true, false) => Ok(LiquidityEntry::EthPaired { eth_is_a: true }),
        (false, true) => Ok(LiquidityEntry::EthPaired { eth_is_a: false }),
        (false, false) => Ok(LiquidityEntry::Erc20Only),
        (true, true) => unreachable!("distinct tokens cannot both be weth"),
    }
}

/// Desired/minimum amounts for one side of a deposit
#[derive(Debug, Clone, Copy)]
pub struct LiquidityLeg {
    pub desired: Amount,
    pub min: Amount,
}

/// addLiquidity(tokenA, tokenB, amountADesired, amountBDesired, amountAMin,
/// amountBMin, to, deadline), or addLiquidityETH(token, amountTokenDesired,
/// amountTokenMin, amountETHMin, to, deadline) with the ETH leg as value.
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity(
    router: &Address,
    entry: LiquidityEntry,
    token_a: &TokenRef,
    token_b: &TokenRef,
    leg_a: LiquidityLeg,
    leg_b: LiquidityLeg,
    recipient: &Address,
    deadline: u64,
) -> ContractCall {
    match entry {
        LiquidityEntry::Erc20Only => ContractCall::new(router.clone(), abi::ADD_LIQUIDITY)
            .address(&token_a.address)
            .address(&token_b.address)
            .uint(leg_a.desired)
            .uint(leg_b.desired)
            .uint(leg_a.min)
            .uint(leg_b.min)
            .address(recipient)
            .uint(deadline as Amount),
        LiquidityEntry::EthPaired { eth_is_a } => {
            let (token, token_leg, eth_leg) = if eth_is_a {
                (token_b, leg_b, leg_a)
            } else {
                (token_a, leg_a, leg_b)
            };
            ContractCall::new(router.clone(), abi::ADD_LIQUIDITY_ETH)
                .address(&token.address)
                .uint(token_leg.desired)
                .uint(token_leg.min)
                .uint(eth_leg.min)
                .address(recipient)
                .uint(deadline as Amount)
                .with_value(eth_leg.desired)
        }
    }
}

/// removeLiquidity(tokenA, tokenB, liquidity, amountAMin, amountBMin, to, deadline)
#[allow(clippy::too_many_arguments)]
pub fn remove_liquidity(
    router: &Address,
    token_a: &TokenRef,
    token_b: &TokenRef,
    liquidity: Amount,
    amount_a_min: Amount,
    amount_b_min: Amount,
    recipient: &Address,
    deadline: u64,
) -> ContractCall {
    ContractCall::new(router.clone(), abi::REMOVE_LIQUIDITY)
        .address(&token_a.address)
        .address(&token_b.address)
        .uint(liquidity)
        .uint(amount_a_min)
        .uint(amount_b_min)
        .address(recipient)
        .uint(deadline as Amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tidepool_core::types::constants::WETH_MAINNET;

    fn usdc() -> TokenRef {
        TokenRef::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", 6)
    }

    fn dai() -> TokenRef {
        TokenRef::new("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", 18)
    }

    fn weth() -> TokenRef {
        TokenRef::new(WETH_MAINNET, "WETH", 18)
    }

    fn router() -> Address {
        Address::new("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D")
    }

    fn alice() -> Address {
        Address::new("0xa11ce00000000000000000000000000000000000")
    }

    #[test]
    fn test_deadline_window() {
        assert_eq!(deadline_from(1_700_000_000), 1_700_001_200);
    }

    #[test]
    fn test_approve_shape() {
        let call = approve(&usdc(), &router(), 5_000_000);
        assert_eq!(call.function, "approve");
        assert_eq!(call.to, usdc().address);
        assert_eq!(call.args, vec![json!(router().as_str()), json!("5000000")]);
    }

    #[test]
    fn test_swap_shape() {
        let call = swap_exact_tokens(
            &router(),
            &usdc(),
            &dai(),
            1_000_000,
            990_000,
            &alice(),
            1_700_001_200,
        );
        assert_eq!(call.function, "swapExactTokensForTokens");
        assert_eq!(call.to, router());
        assert_eq!(call.args.len(), 5);
        assert_eq!(call.args[0], json!("1000000"));
        assert_eq!(call.args[1], json!("990000"));
        assert_eq!(
            call.args[2],
            json!([usdc().address.as_str(), dai().address.as_str()])
        );
        assert_eq!(call.args[3], json!(alice().as_str()));
        assert_eq!(call.args[4], json!("1700001200"));
        assert!(call.value.is_none());
    }

    #[test]
    fn test_entry_selection() {
        let weth_addr = Address::new(WETH_MAINNET);
        assert_eq!(
            select_liquidity_entry(&usdc(), &dai(), &weth_addr).unwrap(),
            LiquidityEntry::Erc20Only
        );
        assert_eq!(
            select_liquidity_entry(&weth(), &dai(), &weth_addr).unwrap(),
            LiquidityEntry::EthPaired { eth_is_a: true }
        );
        assert_eq!(
            select_liquidity_entry(&dai(), &weth(), &weth_addr).unwrap(),
            LiquidityEntry::EthPaired { eth_is_a: false }
        );
        assert!(select_liquidity_entry(&dai(), &dai(), &weth_addr).is_err());
    }

    #[test]
    fn test_add_liquidity_erc20_shape() {
        let call = add_liquidity(
            &router(),
            LiquidityEntry::Erc20Only,
            &usdc(),
            &dai(),
            LiquidityLeg {
                desired: 100,
                min: 99,
            },
            LiquidityLeg {
                desired: 200,
                min: 198,
            },
            &alice(),
            1_700_001_200,
        );
        assert_eq!(call.function, "addLiquidity");
        assert_eq!(call.args.len(), 8);
        assert_eq!(call.args[2], json!("100"));
        assert_eq!(call.args[5], json!("198"));
        assert!(call.value.is_none());
    }

    #[test]
    fn test_add_liquidity_eth_shape() {
        // WETH on the A side: it must travel as call value, and the ERC-20
        // leg takes the token argument positions
        let call = add_liquidity(
            &router(),
            LiquidityEntry::EthPaired { eth_is_a: true },
            &weth(),
            &dai(),
            LiquidityLeg {
                desired: 1_000_000_000_000_000_000,
                min: 995_000_000_000_000_000,
            },
            LiquidityLeg {
                desired: 3_000,
                min: 2_985,
            },
            &alice(),
            1_700_001_200,
        );
        assert_eq!(call.function, "addLiquidityETH");
        assert_eq!(call.args.len(), 6);
        assert_eq!(call.args[0], json!(dai().address.as_str()));
        assert_eq!(call.args[1], json!("3000"));
        assert_eq!(call.args[2], json!("2985"));
        assert_eq!(call.args[3], json!("995000000000000000"));
        assert_eq!(call.value.as_deref(), Some("1000000000000000000"));
    }

    #[test]
    fn test_remove_liquidity_shape() {
        let call = remove_liquidity(
            &router(),
            &usdc(),
            &dai(),
            500,
            10_000,
            1_000,
            &alice(),
            1_700_001_200,
        );
        assert_eq!(call.function, "removeLiquidity");
        assert_eq!(call.args.len(), 7);
        assert_eq!(call.args[2], json!("500"));
    }
}
