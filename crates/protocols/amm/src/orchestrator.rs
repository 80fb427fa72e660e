//! Swap and liquidity orchestrators
//!
//! One orchestrator instance drives one user-confirmed operation through
//! allowance check, optional approval, submission, and the confirmation
//! race, then fires the best-effort pool-cache refresh. Steps are strictly
//! sequential within an instance, so a single operation can never
//! double-approve or double-submit against the same nonce. Nothing locks
//! across instances; allowance reads are advisory snapshots and the chain's
//! own ordering rules arbitrate concurrent clients.
//!
//! On-chain arguments (minimum output, minimum amounts, deadline) are
//! re-derived from a fresh pool snapshot at execution time. The previewed
//! quote the user confirmed is treated as stale the moment it is shown.

use std::sync::Arc;

use evm_client::{ConfirmationWaiter, EvmProvider, TxOutcome, TxReceipt};
use tidepool_core::{Address, Amount, ChainConfig, TokenRef, TxConfig};

use crate::allowance::{AllowanceGate, AllowanceOutcome};
use crate::calculator;
use crate::constants::slippage;
use crate::fetch::{self, PoolSource};
use crate::liquidity;
use crate::state::{AmmError, OperationKind, PendingOperation, PoolState};
use crate::tx_builder::{self, LiquidityEntry, LiquidityLeg};

// =============================================================================
// Requests
// =============================================================================

/// User-confirmed swap parameters
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub owner: Address,
    /// Defaults to the owner
    pub recipient: Option<Address>,
    pub token_in: TokenRef,
    pub token_out: TokenRef,
    pub amount_in: Amount,
    /// Tolerance in percent, [0, 50]
    pub slippage_pct: f64,
}

/// User-confirmed add-liquidity parameters
#[derive(Debug, Clone)]
pub struct AddLiquidityRequest {
    pub owner: Address,
    pub token_a: TokenRef,
    pub token_b: TokenRef,
    pub amount_a_desired: Amount,
    pub amount_b_desired: Amount,
    pub slippage_pct: f64,
}

/// User-confirmed remove-liquidity parameters
#[derive(Debug, Clone)]
pub struct RemoveLiquidityRequest {
    pub owner: Address,
    pub token_a: TokenRef,
    pub token_b: TokenRef,
    pub lp_amount: Amount,
    pub slippage_pct: f64,
}

// =============================================================================
// Results
// =============================================================================

/// Classified cause of an on-chain failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Output fell below the minimum; user must raise slippage or re-quote
    SlippageExceeded,
    /// One liquidity leg fell below its minimum
    ImbalancedAmounts,
    /// The deadline passed before execution
    Expired,
    /// Token transfer-from failed (allowance or balance drained in flight)
    TransferFailed,
    Unknown,
}

/// Map a router revert reason onto the failure taxonomy
pub fn classify_failure(reason: &str) -> FailureKind {
    if reason.contains("INSUFFICIENT_OUTPUT_AMOUNT") {
        FailureKind::SlippageExceeded
    } else if reason.contains("INSUFFICIENT_A_AMOUNT") || reason.contains("INSUFFICIENT_B_AMOUNT") {
        FailureKind::ImbalancedAmounts
    } else if reason.contains("EXPIRED") {
        FailureKind::Expired
    } else if reason.contains("TRANSFER_FROM_FAILED") {
        FailureKind::TransferFailed
    } else {
        FailureKind::Unknown
    }
}

/// Terminal record of one orchestrated operation
#[derive(Debug)]
pub struct OperationResult {
    pub operation: PendingOperation,
    pub receipt: Option<TxReceipt>,
    pub failure: Option<FailureKind>,
}

impl OperationResult {
    fn from_outcome(kind: OperationKind, outcome: TxOutcome) -> Self {
        let mut operation = PendingOperation::new(kind);
        operation.resolve(&outcome);
        let (receipt, failure) = match outcome {
            TxOutcome::Confirmed(receipt) => (Some(receipt), None),
            TxOutcome::Failed { ref reason, .. } => (None, Some(classify_failure(reason))),
            _ => (None, None),
        };
        Self {
            operation,
            receipt,
            failure,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.receipt.is_some()
    }
}

// =============================================================================
// Shared plumbing
// =============================================================================

fn validate_slippage(pct: f64) -> Result<(), AmmError> {
    if !pct.is_finite() || !(0.0..=slippage::MAX_PCT).contains(&pct) {
        return Err(AmmError::SlippageOutOfRange {
            value: pct,
            max: slippage::MAX_PCT,
        });
    }
    Ok(())
}

/// Pre-flight balance read; rejects before anything is built or signed
async fn check_balance(
    provider: &dyn EvmProvider,
    owner: &Address,
    token: &TokenRef,
    required: Amount,
) -> Result<(), AmmError> {
    let value = provider
        .read_contract(&tx_builder::balance_read(token, owner))
        .await?;
    let available = evm_client::parse_amount(&value)?;
    if available < required {
        return Err(AmmError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

/// Fire-and-forget read-model catch-up. The transaction already succeeded
/// on-chain; a failed refresh only delays the UI and is logged, not
/// surfaced.
fn spawn_refresh(pools: &Arc<dyn PoolSource>, token_a: &TokenRef, token_b: &TokenRef) {
    let pools = Arc::clone(pools);
    let (a, b) = (token_a.clone(), token_b.clone());
    tokio::spawn(async move {
        if let Err(e) = pools.request_refresh(&a, &b).await {
            tracing::warn!(error = %e, "pool refresh request failed");
        }
    });
}

// =============================================================================
// SwapOrchestrator
// =============================================================================

/// Drives a single token swap from user confirmation to terminal state
pub struct SwapOrchestrator {
    provider: Arc<dyn EvmProvider>,
    pools: Arc<dyn PoolSource>,
    chain: ChainConfig,
    waiter: ConfirmationWaiter,
    required_confirmations: u64,
}

impl SwapOrchestrator {
    pub fn new(
        provider: Arc<dyn EvmProvider>,
        pools: Arc<dyn PoolSource>,
        chain: ChainConfig,
        tx: &TxConfig,
    ) -> Self {
        Self {
            provider,
            pools,
            chain,
            waiter: ConfirmationWaiter::from_config(tx),
            required_confirmations: tx.required_confirmations,
        }
    }

    /// Execute a swap. Pre-flight violations come back as `Err` before any
    /// transaction is built; everything after submission is a terminal
    /// `OperationResult`. Retrying any outcome means a fresh call with a
    /// fresh quote; nothing here resubmits.
    pub async fn execute(&self, request: &SwapRequest) -> Result<OperationResult, AmmError> {
        if request.amount_in == 0 {
            return Err(AmmError::BuildError("swap amount must be non-zero".into()));
        }
        if request.token_in.is_same(&request.token_out) {
            return Err(AmmError::BuildError(
                "swap requires two distinct tokens".into(),
            ));
        }
        validate_slippage(request.slippage_pct)?;

        // Fresh snapshot; the previewed quote is already stale
        let pool =
            fetch::load_pool(self.pools.as_ref(), &request.token_in, &request.token_out).await?;
        let quote = calculator::quote(
            &pool,
            &request.token_in,
            request.amount_in,
            &[request.slippage_pct],
        )?;
        let min_out = calculator::apply_slippage(quote.amount_out, request.slippage_pct);
        tracing::info!(
            amount_in = request.amount_in,
            amount_out = quote.amount_out,
            min_out,
            impact_pct = quote.price_impact_pct,
            "derived swap arguments"
        );

        check_balance(
            self.provider.as_ref(),
            &request.owner,
            &request.token_in,
            request.amount_in,
        )
        .await?;

        tracing::info!(token = %request.token_in.symbol, "checking allowance");
        let gate = AllowanceGate::new(
            self.provider.as_ref(),
            &self.waiter,
            self.required_confirmations,
        );
        let allowance = gate
            .ensure_allowance(
                &request.owner,
                &self.chain.router,
                &request.token_in,
                request.amount_in,
            )
            .await?;
        if let AllowanceOutcome::NotApproved(outcome) = allowance {
            // Approval aborted the operation; the swap itself is never submitted
            return Ok(OperationResult::from_outcome(OperationKind::Approve, outcome));
        }

        let recipient = request
            .recipient
            .clone()
            .unwrap_or_else(|| request.owner.clone());
        let deadline = tx_builder::deadline_from(tx_builder::unix_now());
        let call = tx_builder::swap_exact_tokens(
            &self.chain.router,
            &request.token_in,
            &request.token_out,
            request.amount_in,
            min_out,
            &recipient,
            deadline,
        );

        tracing::info!(kind = %OperationKind::Swap, "submitting");
        let outcome = self
            .waiter
            .submit_and_wait(self.provider.as_ref(), &call, self.required_confirmations)
            .await;
        let result = OperationResult::from_outcome(OperationKind::Swap, outcome);

        if result.succeeded() {
            spawn_refresh(&self.pools, &request.token_in, &request.token_out);
        }
        Ok(result)
    }
}

// =============================================================================
// LiquidityOrchestrator
// =============================================================================

/// Drives add/remove liquidity operations
pub struct LiquidityOrchestrator {
    provider: Arc<dyn EvmProvider>,
    pools: Arc<dyn PoolSource>,
    chain: ChainConfig,
    waiter: ConfirmationWaiter,
    required_confirmations: u64,
}

impl LiquidityOrchestrator {
    pub fn new(
        provider: Arc<dyn EvmProvider>,
        pools: Arc<dyn PoolSource>,
        chain: ChainConfig,
        tx: &TxConfig,
    ) -> Self {
        Self {
            provider,
            pools,
            chain,
            waiter: ConfirmationWaiter::from_config(tx),
            required_confirmations: tx.required_confirmations,
        }
    }

    fn gate(&self) -> AllowanceGate<'_> {
        AllowanceGate::new(
            self.provider.as_ref(),
            &self.waiter,
            self.required_confirmations,
        )
    }

    /// Add liquidity to an existing or fresh pool.
    ///
    /// The entry point (ERC-20-only vs ETH-paired) is a pure function of
    /// the token addresses, decided once here. The wrapped-native leg rides
    /// as call value and needs no allowance.
    pub async fn add(&self, request: &AddLiquidityRequest) -> Result<OperationResult, AmmError> {
        if request.amount_a_desired == 0 || request.amount_b_desired == 0 {
            return Err(AmmError::BuildError(
                "both deposit amounts must be non-zero".into(),
            ));
        }
        validate_slippage(request.slippage_pct)?;
        let entry =
            tx_builder::select_liquidity_entry(&request.token_a, &request.token_b, &self.chain.weth)?;

        let pool = self
            .pools
            .pool_state(&request.token_a, &request.token_b)
            .await
            .map_err(|e| AmmError::PoolUnavailable(e.to_string()))?;
        let seeded = pool.as_ref().map(|p| p.total_supply > 0).unwrap_or(false);

        let preview = liquidity::preview_add_liquidity(
            pool.as_ref(),
            &request.token_a,
            request.amount_a_desired,
            request.amount_b_desired,
        )?;
        tracing::info!(
            lp_minted = preview.lp_minted,
            share_pct = preview.share_of_pool_pct,
            seeded,
            "derived deposit arguments"
        );

        // A fresh pool has no price to protect; mins equal the deposit.
        let (min_a, min_b) = if seeded {
            (
                calculator::apply_slippage(request.amount_a_desired, request.slippage_pct),
                calculator::apply_slippage(request.amount_b_desired, request.slippage_pct),
            )
        } else {
            (request.amount_a_desired, request.amount_b_desired)
        };

        let legs = [
            (&request.token_a, request.amount_a_desired, true),
            (&request.token_b, request.amount_b_desired, false),
        ];
        for (token, amount, is_a) in legs {
            if is_eth_leg(entry, is_a) {
                continue;
            }
            check_balance(self.provider.as_ref(), &request.owner, token, amount).await?;
            let allowance = self
                .gate()
                .ensure_allowance(&request.owner, &self.chain.router, token, amount)
                .await?;
            if let AllowanceOutcome::NotApproved(outcome) = allowance {
                return Ok(OperationResult::from_outcome(OperationKind::Approve, outcome));
            }
        }

        let deadline = tx_builder::deadline_from(tx_builder::unix_now());
        let call = tx_builder::add_liquidity(
            &self.chain.router,
            entry,
            &request.token_a,
            &request.token_b,
            LiquidityLeg {
                desired: request.amount_a_desired,
                min: min_a,
            },
            LiquidityLeg {
                desired: request.amount_b_desired,
                min: min_b,
            },
            &request.owner,
            deadline,
        );

        tracing::info!(kind = %OperationKind::AddLiquidity, "submitting");
        let outcome = self
            .waiter
            .submit_and_wait(self.provider.as_ref(), &call, self.required_confirmations)
            .await;
        let result = OperationResult::from_outcome(OperationKind::AddLiquidity, outcome);

        if result.succeeded() {
            spawn_refresh(&self.pools, &request.token_a, &request.token_b);
        }
        Ok(result)
    }

    /// Remove liquidity from an existing pool. The LP token (minted at the
    /// pair address) is what the router must be allowed to move.
    pub async fn remove(
        &self,
        request: &RemoveLiquidityRequest,
    ) -> Result<OperationResult, AmmError> {
        if request.lp_amount == 0 {
            return Err(AmmError::BuildError("LP amount must be non-zero".into()));
        }
        validate_slippage(request.slippage_pct)?;

        let pool =
            fetch::load_pool(self.pools.as_ref(), &request.token_a, &request.token_b).await?;
        let (expected_a, expected_b) =
            oriented_remove_amounts(&pool, &request.token_a, request.lp_amount)?;
        let min_a = calculator::apply_slippage(expected_a, request.slippage_pct);
        let min_b = calculator::apply_slippage(expected_b, request.slippage_pct);
        tracing::info!(expected_a, expected_b, min_a, min_b, "derived withdrawal arguments");

        let lp_token = pool.lp_token();
        check_balance(
            self.provider.as_ref(),
            &request.owner,
            &lp_token,
            request.lp_amount,
        )
        .await?;
        let allowance = self
            .gate()
            .ensure_allowance(
                &request.owner,
                &self.chain.router,
                &lp_token,
                request.lp_amount,
            )
            .await?;
        if let AllowanceOutcome::NotApproved(outcome) = allowance {
            return Ok(OperationResult::from_outcome(OperationKind::Approve, outcome));
        }

        let deadline = tx_builder::deadline_from(tx_builder::unix_now());
        let call = tx_builder::remove_liquidity(
            &self.chain.router,
            &request.token_a,
            &request.token_b,
            request.lp_amount,
            min_a,
            min_b,
            &request.owner,
            deadline,
        );

        tracing::info!(kind = %OperationKind::RemoveLiquidity, "submitting");
        let outcome = self
            .waiter
            .submit_and_wait(self.provider.as_ref(), &call, self.required_confirmations)
            .await;
        let result = OperationResult::from_outcome(OperationKind::RemoveLiquidity, outcome);

        if result.succeeded() {
            spawn_refresh(&self.pools, &request.token_a, &request.token_b);
        }
        Ok(result)
    }
}

fn is_eth_leg(entry: LiquidityEntry, is_a: bool) -> bool {
    matches!(entry, LiquidityEntry::EthPaired { eth_is_a } if eth_is_a == is_a)
}

/// Orient the pro-rata withdrawal amounts to the caller's (token_a, token_b)
/// order, which may be reversed against the pool's token0/token1.
fn oriented_remove_amounts(
    pool: &PoolState,
    token_a: &TokenRef,
    lp_amount: Amount,
) -> Result<(Amount, Amount), AmmError> {
    let preview = liquidity::preview_remove_liquidity(pool, lp_amount)?;
    if pool.token0.is_same(token_a) {
        Ok((preview.amount0, preview.amount1))
    } else if pool.token1.is_same(token_a) {
        Ok((preview.amount1, preview.amount0))
    } else {
        Err(AmmError::UnknownToken(token_a.address.to_string()))
    }
}
