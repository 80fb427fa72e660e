//! evm-client: Wallet/provider boundary for Tidepool
//!
//! This crate defines the seam between the core and the wallet/provider it
//! talks to: contract reads, value-moving submissions (which may suspend
//! indefinitely on a signature prompt), and receipt lookups. The provider is
//! treated as slow, user-interactive, and fallible; nothing here caches
//! chain state.

pub mod call;
pub mod waiter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tidepool_core::{Amount, BlockNumber, ProviderError, TxHash};

pub use call::ContractCall;
pub use waiter::{ConfirmationWaiter, TxOutcome};

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Execution status carried by a receipt.
///
/// Confirmation latency and execution success are distinct axes: a receipt
/// can arrive promptly and still report a revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Transaction receipt as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: BlockNumber,
    /// Confirmations observed at the time of the lookup
    pub confirmations: u64,
    pub status: ReceiptStatus,
    /// Revert reason when the provider surfaces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Wallet/provider boundary.
///
/// `submit_transaction` blocks on user interaction and has no timeout; only
/// an explicit rejection (`ProviderError::UserRejected`) ends it early.
/// `receipt` returns `Ok(None)` while the transaction is still pending.
#[async_trait]
pub trait EvmProvider: Send + Sync {
    /// Read-only contract call; safe to retry on RPC failure.
    async fn read_contract(&self, call: &ContractCall) -> Result<serde_json::Value>;

    /// Sign and broadcast a value-moving call, returning the hash.
    async fn submit_transaction(&self, call: &ContractCall) -> Result<TxHash>;

    /// Look up the receipt for a submitted transaction, if any.
    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>>;
}

/// Parse an amount out of a provider read result.
///
/// Providers disagree on encoding: some return JSON numbers, some decimal
/// strings, some 0x-hex strings. All three are accepted.
pub fn parse_amount(value: &serde_json::Value) -> Result<Amount> {
    if let Some(n) = value.as_u64() {
        return Ok(n as Amount);
    }
    if let Some(s) = value.as_str() {
        if let Some(hex_body) = s.strip_prefix("0x") {
            return Amount::from_str_radix(hex_body, 16)
                .map_err(|e| ProviderError::InvalidResponse(format!("bad hex amount {s}: {e}")));
        }
        return s
            .parse::<Amount>()
            .map_err(|e| ProviderError::InvalidResponse(format!("bad amount {s}: {e}")));
    }
    Err(ProviderError::InvalidResponse(format!(
        "expected amount, got {value}"
    )))
}
