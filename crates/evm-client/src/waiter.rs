//! Transaction confirmation waiter
//!
//! Submits a value-moving call and races its confirmation against a fixed
//! timer. Submission itself has no timeout: the wallet prompt may sit in
//! front of the user indefinitely and only an explicit rejection ends it.
//! Once a hash exists, the race begins; the losing side is not cancelled at
//! the provider, so `TimedOut` means "unknown, check later" rather than
//! "failed". No outcome is ever retried here; resubmission is a new
//! transaction and a caller decision.

use std::time::Duration;

use tidepool_core::{ProviderError, TxConfig, TxHash};

use crate::{ContractCall, EvmProvider, TxReceipt};

/// Default confirmation race budget (30 seconds)
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default receipt poll cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Tri-state-plus-rejection outcome of a submission
#[derive(Debug, Clone)]
pub enum TxOutcome {
    /// Receipt observed with the required confirmations and success status
    Confirmed(TxReceipt),
    /// The timer won the race. The transaction may still confirm later
    /// out-of-band; the hash is returned so the caller can check.
    TimedOut { tx_hash: TxHash },
    /// Submission failed, or the receipt reported a revert
    Failed {
        tx_hash: Option<TxHash>,
        reason: String,
    },
    /// The user declined the signature prompt; nothing was broadcast
    Rejected,
}

impl TxOutcome {
    /// Hash of the broadcast transaction, when one exists
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            Self::Confirmed(receipt) => Some(&receipt.tx_hash),
            Self::TimedOut { tx_hash } => Some(tx_hash),
            Self::Failed { tx_hash, .. } => tx_hash.as_ref(),
            Self::Rejected => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Races receipt polling against a wall-clock timer
#[derive(Debug, Clone)]
pub struct ConfirmationWaiter {
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl Default for ConfirmationWaiter {
    fn default() -> Self {
        Self {
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ConfirmationWaiter {
    pub fn new(confirmation_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            confirmation_timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &TxConfig) -> Self {
        Self {
            confirmation_timeout: Duration::from_millis(config.confirmation_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Submit `call` and wait for `required_confirmations`.
    ///
    /// The submission phase is unbounded; the confirmation phase is bounded
    /// by the configured timeout.
    pub async fn submit_and_wait(
        &self,
        provider: &dyn EvmProvider,
        call: &ContractCall,
        required_confirmations: u64,
    ) -> TxOutcome {
        let tx_hash = match provider.submit_transaction(call).await {
            Ok(hash) => hash,
            Err(ProviderError::UserRejected) => {
                tracing::info!(function = %call.function, "signature request rejected");
                return TxOutcome::Rejected;
            }
            Err(e) => {
                return TxOutcome::Failed {
                    tx_hash: None,
                    reason: e.to_string(),
                }
            }
        };

        tracing::info!(%tx_hash, function = %call.function, "transaction submitted");
        self.wait(provider, tx_hash, required_confirmations).await
    }

    /// Wait for an already-submitted transaction.
    pub async fn wait(
        &self,
        provider: &dyn EvmProvider,
        tx_hash: TxHash,
        required_confirmations: u64,
    ) -> TxOutcome {
        let receipt = tokio::select! {
            receipt = watch_receipt(provider, &tx_hash, required_confirmations, self.poll_interval) => receipt,
            _ = tokio::time::sleep(self.confirmation_timeout) => {
                tracing::warn!(%tx_hash, timeout_ms = self.confirmation_timeout.as_millis() as u64,
                    "confirmation wait timed out; transaction status unknown");
                return TxOutcome::TimedOut { tx_hash: tx_hash.clone() };
            }
        };

        // Confirmation latency and execution success are separate axes:
        // a confirmed receipt can still carry a revert.
        if receipt.is_success() {
            tracing::info!(%tx_hash, block = receipt.block_number, "transaction confirmed");
            TxOutcome::Confirmed(receipt)
        } else {
            let reason = receipt
                .revert_reason
                .clone()
                .unwrap_or_else(|| "reverted on-chain".to_string());
            tracing::warn!(%tx_hash, %reason, "transaction reverted");
            TxOutcome::Failed {
                tx_hash: Some(tx_hash),
                reason,
            }
        }
    }
}

/// Poll until a receipt with enough confirmations appears.
///
/// Transient RPC failures keep the loop alive; the timer in `wait` bounds
/// the total time spent here.
async fn watch_receipt(
    provider: &dyn EvmProvider,
    tx_hash: &TxHash,
    required_confirmations: u64,
    poll_interval: Duration,
) -> TxReceipt {
    loop {
        match provider.receipt(tx_hash).await {
            Ok(Some(receipt)) if receipt.confirmations >= required_confirmations => {
                return receipt;
            }
            Ok(Some(receipt)) => {
                tracing::debug!(%tx_hash, confirmations = receipt.confirmations, "awaiting confirmations");
            }
            Ok(None) => {
                tracing::debug!(%tx_hash, "transaction pending");
            }
            Err(e) => {
                tracing::debug!(%tx_hash, error = %e, "receipt poll failed, will retry");
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}
