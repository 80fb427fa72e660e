//! Error types for Tidepool

use thiserror::Error;

/// Core errors that can occur in Tidepool
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wallet/provider boundary errors.
///
/// The provider is slow, user-interactive, and fallible; these variants
/// separate the transient from the final so callers know what is safe to
/// retry.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("RPC error: {message}")]
    Rpc { message: String },

    #[error("User rejected the signature request")]
    UserRejected,

    #[error("Failed to parse provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether the failed call is safe to re-issue as-is.
    /// Rejection is a user decision, not a fault, and is never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc { .. } => true,
            Self::UserRejected => false,
            Self::InvalidResponse(_) => true,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "rpc_error",
            Self::UserRejected => "user_rejected",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, Error>;
