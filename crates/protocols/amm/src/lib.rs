//! Constant-product AMM protocol implementation
//!
//! This crate implements the swap and liquidity flows of the Tidepool
//! client: quote math against pool snapshots, the allowance gate, router
//! call building, and the orchestrators that sequence a user-confirmed
//! operation through approval, submission, and confirmation.

pub mod allowance;
pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod liquidity;
pub mod orchestrator;
pub mod slippage;
pub mod state;
pub mod tx_builder;

// Re-exports
pub use allowance::{AllowanceGate, AllowanceOutcome};
pub use calculator::{apply_slippage, calculate_input, calculate_output, calculate_price_impact, quote};
pub use fetch::{best_quote, load_pool, PoolSource};
pub use liquidity::{
    counterpart_amount, initial_lp_mint, lp_mint, preview_add_liquidity, preview_remove_liquidity,
};
pub use orchestrator::{
    classify_failure, AddLiquidityRequest, FailureKind, LiquidityOrchestrator, OperationResult,
    RemoveLiquidityRequest, SwapOrchestrator, SwapRequest,
};
pub use slippage::{
    FileSlippageStore, MemorySlippageStore, SlippagePolicy, SlippageStore, WarningLevel,
};
pub use state::{
    AmmError, LiquidityDepth, LiquidityPreview, OperationKind, OperationStatus, PendingOperation,
    PoolState, Quote, RemovePreview, SlippageTier,
};
pub use tx_builder::{select_liquidity_entry, LiquidityEntry, LiquidityLeg};
