//! AMM Constants
//!
//! Fee parameters, classification thresholds, and preference defaults.

/// Fee constants
pub mod fees {
    /// Pool fee numerator (0.3% fee = 997/1000)
    pub const FEE_NUM: u32 = 997;

    /// Pool fee denominator
    pub const FEE_DENOM: u32 = 1000;
}

/// Liquidity depth classification thresholds.
///
/// Advisory only; depth never blocks execution.
pub mod depth {
    /// reserve_in >= 100x amount_in reads as a deep pool
    pub const HIGH_MULTIPLE: u128 = 100;

    /// reserve_in >= 10x amount_in is workable
    pub const MEDIUM_MULTIPLE: u128 = 10;
}

/// Price-impact warning thresholds (percent)
pub mod impact {
    pub const LOW_PCT: f64 = 1.0;
    pub const MEDIUM_PCT: f64 = 3.0;
    pub const HIGH_PCT: f64 = 5.0;
    pub const BLOCKED_PCT: f64 = 15.0;
}

/// Slippage preference constants
pub mod slippage {
    /// Storage key for the persisted user preference
    pub const STORAGE_KEY: &str = "tidepool.slippage_pct";

    /// Default tolerance when nothing valid is stored (percent)
    pub const DEFAULT_PCT: f64 = 0.5;

    /// Upper bound of the accepted range (percent)
    pub const MAX_PCT: f64 = 50.0;

    /// Basis-point denominator used for floor arithmetic
    pub const BPS_DENOM: u128 = 10_000;

    /// Tiers shown in the minimum-received preview table (percent)
    pub const PREVIEW_TIERS: [f64; 3] = [0.1, 0.5, 1.0];
}

/// LP token metadata. Pair contracts mint their LP token at the pair
/// address itself with a fixed 18 decimals.
pub mod lp {
    pub const LP_SYMBOL: &str = "UNI-V2";
    pub const LP_DECIMALS: u8 = 18;
}
