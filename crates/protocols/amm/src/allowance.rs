//! ERC-20 allowance gate
//!
//! Every value-moving router call is preceded by this gate. The allowance
//! is re-read from chain on every invocation, never cached across
//! operations (another client may have spent or re-approved in between).
//! A covered allowance is a pure no-op, which is what keeps repeated swaps
//! on the same pair cheap.

use evm_client::{ConfirmationWaiter, EvmProvider, TxOutcome, TxReceipt};
use tidepool_core::{Address, Amount, TokenRef};

use crate::state::{AmmError, OperationKind, PendingOperation};
use crate::tx_builder;

/// Outcome of an allowance check
#[derive(Debug)]
pub enum AllowanceOutcome {
    /// Allowance already covers the required amount; nothing submitted
    AlreadySufficient,
    /// An approval was submitted and confirmed
    Approved(TxReceipt),
    /// An approval was needed but did not complete
    NotApproved(TxOutcome),
}

impl AllowanceOutcome {
    /// Whether the spender can now move the required amount
    pub fn is_cleared(&self) -> bool {
        matches!(self, Self::AlreadySufficient | Self::Approved(_))
    }
}

/// Checks and, when needed, raises a spender allowance
pub struct AllowanceGate<'a> {
    provider: &'a dyn EvmProvider,
    waiter: &'a ConfirmationWaiter,
    required_confirmations: u64,
}

impl<'a> AllowanceGate<'a> {
    pub fn new(
        provider: &'a dyn EvmProvider,
        waiter: &'a ConfirmationWaiter,
        required_confirmations: u64,
    ) -> Self {
        Self {
            provider,
            waiter,
            required_confirmations,
        }
    }

    /// Read the live allowance(owner, spender) for `token`
    pub async fn current_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        token: &TokenRef,
    ) -> Result<Amount, AmmError> {
        let call = tx_builder::allowance_read(token, owner, spender);
        let value = self.provider.read_contract(&call).await?;
        Ok(evm_client::parse_amount(&value)?)
    }

    /// Ensure `spender` may move `required` units of `token`.
    ///
    /// Approves exactly the required amount: no unlimited approvals, and
    /// no zero-then-approve dance for tokens with non-standard allowance
    /// semantics (those revert here and surface as `NotApproved`).
    ///
    /// A failed chain read is an `Err` and safe to retry; everything past
    /// submission is reported through the outcome without side effects.
    pub async fn ensure_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        token: &TokenRef,
        required: Amount,
    ) -> Result<AllowanceOutcome, AmmError> {
        let current = self.current_allowance(owner, spender, token).await?;
        if current >= required {
            tracing::debug!(token = %token.symbol, %current, %required, "allowance already sufficient");
            return Ok(AllowanceOutcome::AlreadySufficient);
        }

        tracing::info!(token = %token.symbol, %current, %required, "raising allowance");
        let call = tx_builder::approve(token, spender, required);
        let mut operation = PendingOperation::new(OperationKind::Approve);
        let outcome = self
            .waiter
            .submit_and_wait(self.provider, &call, self.required_confirmations)
            .await;
        operation.resolve(&outcome);
        tracing::info!(op = %operation.id, status = ?operation.status, "approval resolved");

        match outcome {
            TxOutcome::Confirmed(receipt) => Ok(AllowanceOutcome::Approved(receipt)),
            other => Ok(AllowanceOutcome::NotApproved(other)),
        }
    }
}
