//! AMM State Types
//!
//! Data structures for pools, quotes, previews, and in-flight operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use evm_client::TxOutcome;
use tidepool_core::{Address, Amount, ProviderError, TokenRef, TxHash};

use crate::constants::lp;

/// Constant-product pool snapshot.
///
/// Owned by the external pool-data collaborator; the core only ever reads
/// one snapshot per operation and tolerates it going stale underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    /// Pair contract address (also the LP token address)
    pub pair_address: Address,
    pub token0: TokenRef,
    pub token1: TokenRef,
    /// token0 reserve, smallest unit
    pub reserve0: Amount,
    /// token1 reserve, smallest unit
    pub reserve1: Amount,
    /// Circulating LP token supply
    pub total_supply: Amount,
}

impl PoolState {
    /// Orient reserves around `token_in`: (reserve_in, reserve_out).
    /// None when the token is not part of this pool.
    pub fn reserves_in_out(&self, token_in: &TokenRef) -> Option<(Amount, Amount)> {
        if self.token0.is_same(token_in) {
            Some((self.reserve0, self.reserve1))
        } else if self.token1.is_same(token_in) {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    /// The pool token paired against `token_in`
    pub fn other_token(&self, token_in: &TokenRef) -> Option<&TokenRef> {
        if self.token0.is_same(token_in) {
            Some(&self.token1)
        } else if self.token1.is_same(token_in) {
            Some(&self.token0)
        } else {
            None
        }
    }

    pub fn contains(&self, token: &TokenRef) -> bool {
        self.reserves_in_out(token).is_some()
    }

    /// LP token ref for this pool. Pair contracts mint at their own address.
    pub fn lp_token(&self) -> TokenRef {
        TokenRef::new(self.pair_address.as_str(), lp::LP_SYMBOL, lp::LP_DECIMALS)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} pool {} | {}: {} | {}: {}",
            self.token0.symbol,
            self.token1.symbol,
            self.pair_address,
            self.token0.symbol,
            self.reserve0,
            self.token1.symbol,
            self.reserve1
        )
    }
}

/// Advisory classification of how deep the pool is relative to a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityDepth {
    High,
    Medium,
    Low,
}

/// Minimum-received entry for one slippage tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlippageTier {
    /// Tolerance in percent
    pub pct: f64,
    /// Guaranteed floor of the output at this tolerance
    pub minimum_received: Amount,
}

/// Swap quote with calculated values.
///
/// Derived, never persisted; only valid against the pool snapshot it was
/// computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: Amount,
    pub amount_out: Amount,
    /// Deviation the trade itself causes vs. the pre-trade spot price (%)
    pub price_impact_pct: f64,
    /// Raw smallest-unit rate amount_out / amount_in
    pub execution_price: f64,
    pub minimum_received: Vec<SlippageTier>,
    pub liquidity_depth: LiquidityDepth,
}

/// Add-liquidity projection: what the on-chain mint would credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityPreview {
    pub lp_minted: Amount,
    pub share_of_pool_pct: f64,
}

/// Remove-liquidity projection: pro-rata share of both reserves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovePreview {
    pub amount0: Amount,
    pub amount1: Amount,
}

/// Kind of value-moving operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Approve,
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Swap => "swap",
            Self::AddLiquidity => "addLiquidity",
            Self::RemoveLiquidity => "removeLiquidity",
        };
        write!(f, "{s}")
    }
}

/// Status of an in-flight or finished operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    Submitted,
    Confirmed,
    TimedOut,
    Failed,
    Rejected,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

/// A transient, single-operation record.
///
/// Created when a transaction is handed to the waiter, discarded once the
/// status is terminal. Never persisted, never shared across operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: String,
    pub kind: OperationKind,
    pub tx_hash: Option<TxHash>,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl PendingOperation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            tx_hash: None,
            status: OperationStatus::Submitted,
            failure_reason: None,
        }
    }

    /// Fold a waiter outcome into this record
    pub fn resolve(&mut self, outcome: &TxOutcome) {
        match outcome {
            TxOutcome::Confirmed(receipt) => {
                self.tx_hash = Some(receipt.tx_hash.clone());
                self.status = OperationStatus::Confirmed;
            }
            TxOutcome::TimedOut { tx_hash } => {
                self.tx_hash = Some(tx_hash.clone());
                self.status = OperationStatus::TimedOut;
            }
            TxOutcome::Failed { tx_hash, reason } => {
                self.tx_hash = tx_hash.clone();
                self.status = OperationStatus::Failed;
                self.failure_reason = Some(reason.clone());
            }
            TxOutcome::Rejected => {
                self.status = OperationStatus::Rejected;
            }
        }
    }
}

/// AMM protocol errors
#[derive(Debug, Error)]
pub enum AmmError {
    #[error("Token {0} is not part of this pool")]
    UnknownToken(String),

    #[error("Pool has no liquidity")]
    NoLiquidity,

    #[error("Slippage {value}% outside allowed range 0-{max}%")]
    SlippageOutOfRange { value: f64, max: f64 },

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Amount,
        available: Amount,
    },

    #[error("Pool state unavailable: {0}")]
    PoolUnavailable(String),

    #[error("Failed to persist preference: {0}")]
    PreferenceStore(String),

    #[error("Failed to build call: {0}")]
    BuildError(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl AmmError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownToken(_) => "unknown_token",
            Self::NoLiquidity => "no_liquidity",
            Self::SlippageOutOfRange { .. } => "slippage_out_of_range",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::PoolUnavailable(_) => "pool_unavailable",
            Self::PreferenceStore(_) => "preference_store",
            Self::BuildError(_) => "build_error",
            Self::Provider(_) => "provider_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weth() -> TokenRef {
        TokenRef::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH", 18)
    }

    fn usdc() -> TokenRef {
        TokenRef::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", 6)
    }

    fn dai() -> TokenRef {
        TokenRef::new("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", 18)
    }

    fn pool() -> PoolState {
        PoolState {
            pair_address: Address::new("0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc"),
            token0: usdc(),
            token1: weth(),
            reserve0: 50_000_000_000,
            reserve1: 20_000_000_000_000_000_000_000,
            total_supply: 1_000_000_000_000,
        }
    }

    #[test]
    fn test_reserve_orientation() {
        let p = pool();
        let (r_in, r_out) = p.reserves_in_out(&weth()).unwrap();
        assert_eq!(r_in, p.reserve1);
        assert_eq!(r_out, p.reserve0);

        let (r_in, r_out) = p.reserves_in_out(&usdc()).unwrap();
        assert_eq!(r_in, p.reserve0);
        assert_eq!(r_out, p.reserve1);
    }

    #[test]
    fn test_orientation_is_case_insensitive() {
        let p = pool();
        let shouty = TokenRef::new(
            "0XA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48",
            "USDC",
            6,
        );
        assert!(p.contains(&shouty));
    }

    #[test]
    fn test_unknown_token_not_in_pool() {
        let p = pool();
        assert!(p.reserves_in_out(&dai()).is_none());
        assert!(p.other_token(&dai()).is_none());
    }

    #[test]
    fn test_lp_token_is_pair_address() {
        let p = pool();
        let lp = p.lp_token();
        assert!(lp.address.matches(p.pair_address.as_str()));
        assert_eq!(lp.decimals, 18);
    }

    #[test]
    fn test_operation_resolution() {
        let mut op = PendingOperation::new(OperationKind::Swap);
        assert!(!op.status.is_terminal());

        op.resolve(&TxOutcome::TimedOut {
            tx_hash: TxHash::new("0xabc"),
        });
        assert_eq!(op.status, OperationStatus::TimedOut);
        assert!(op.status.is_terminal());
        assert_eq!(op.tx_hash.as_ref().unwrap().as_str(), "0xabc");
    }

    #[test]
    fn test_rejected_operation_has_no_hash() {
        let mut op = PendingOperation::new(OperationKind::Approve);
        op.resolve(&TxOutcome::Rejected);
        assert_eq!(op.status, OperationStatus::Rejected);
        assert!(op.tx_hash.is_none());
    }
}
