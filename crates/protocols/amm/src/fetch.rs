//! Pool-data boundary
//!
//! The pool cache and quote service are external collaborators: this module
//! defines the read/refresh seam the orchestrators consume, plus the
//! remote-quote-with-local-fallback helper.

use async_trait::async_trait;

use tidepool_core::{Amount, TokenRef};

use crate::calculator;
use crate::state::{AmmError, PoolState, Quote};

/// Read-only provider of pool snapshots and (optionally) server-computed
/// quotes, plus the best-effort refresh endpoint.
///
/// Snapshots are advisory: nothing synchronizes concurrent clients, so a
/// snapshot can be invalidated by an external swap at any time. Callers
/// must re-read per operation and tolerate staleness; the chain's own
/// ordering rules are the final arbiter.
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Snapshot of the pool for a token pair, `None` when no pair exists
    async fn pool_state(
        &self,
        token_a: &TokenRef,
        token_b: &TokenRef,
    ) -> anyhow::Result<Option<PoolState>>;

    /// Server-side quote mirror. Default: not available.
    async fn remote_quote(
        &self,
        _pool: &PoolState,
        _token_in: &TokenRef,
        _amount_in: Amount,
        _slippage_tiers: &[f64],
    ) -> anyhow::Result<Option<Quote>> {
        Ok(None)
    }

    /// Ask the collaborator to re-read pool state from chain.
    /// Asynchronous, idempotent, and safe to drop on failure; never on the
    /// success path of an operation.
    async fn request_refresh(&self, token_a: &TokenRef, token_b: &TokenRef)
        -> anyhow::Result<()>;
}

/// Load a pool snapshot, mapping collaborator failures and missing pairs
/// onto the protocol error taxonomy.
pub async fn load_pool(
    source: &dyn PoolSource,
    token_a: &TokenRef,
    token_b: &TokenRef,
) -> Result<PoolState, AmmError> {
    source
        .pool_state(token_a, token_b)
        .await
        .map_err(|e| AmmError::PoolUnavailable(e.to_string()))?
        .ok_or(AmmError::NoLiquidity)
}

/// Quote through the remote engine when it answers, falling back to the
/// local calculator when it is absent or failing. The local engine also
/// serves as the consistency baseline, so both paths share the same error
/// preconditions.
pub async fn best_quote(
    source: &dyn PoolSource,
    pool: &PoolState,
    token_in: &TokenRef,
    amount_in: Amount,
    slippage_tiers: &[f64],
) -> Result<Quote, AmmError> {
    match source
        .remote_quote(pool, token_in, amount_in, slippage_tiers)
        .await
    {
        Ok(Some(quote)) => Ok(quote),
        Ok(None) => calculator::quote(pool, token_in, amount_in, slippage_tiers),
        Err(e) => {
            tracing::warn!(error = %e, "remote quote failed, falling back to local engine");
            calculator::quote(pool, token_in, amount_in, slippage_tiers)
        }
    }
}
