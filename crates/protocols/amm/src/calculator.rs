//! AMM Calculator
//!
//! Swap math using the constant product formula (x * y = k).
//!
//! All amount arithmetic runs through BigUint so reserve-times-amount
//! products cannot overflow; percentages come out as f64 only at the very
//! end, for display.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use tidepool_core::{Amount, TokenRef};

use crate::constants::{depth, fees, slippage};
use crate::state::{AmmError, LiquidityDepth, PoolState, Quote, SlippageTier};

/// Calculate swap output using the constant product formula
///
/// Formula: output = (reserve_out * input * fee_num) / (reserve_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_in: Amount,
    fee_num: u32,
    fee_denom: u32,
) -> Amount {
    if reserve_in == 0 || reserve_out == 0 || amount_in == 0 {
        return 0;
    }

    let amount_in_with_fee = BigUint::from(amount_in) * BigUint::from(fee_num);
    let numerator = BigUint::from(reserve_out) * &amount_in_with_fee;
    let denominator = BigUint::from(reserve_in) * BigUint::from(fee_denom) + amount_in_with_fee;

    let result = numerator / denominator;
    result.to_u128().unwrap_or(0)
}

/// Calculate required input for a desired output (reverse calculation)
///
/// Formula: input = (reserve_in * output * fee_denom) / ((reserve_out - output) * fee_num) + 1
///
/// Rounds up: paying one unit extra is recoverable, paying one unit short
/// reverts.
pub fn calculate_input(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_out: Amount,
    fee_num: u32,
    fee_denom: u32,
) -> Option<Amount> {
    if reserve_in == 0 || reserve_out == 0 || amount_out == 0 {
        return None;
    }
    if amount_out >= reserve_out {
        return None; // Can't take more than reserves
    }

    let numerator =
        BigUint::from(reserve_in) * BigUint::from(amount_out) * BigUint::from(fee_denom);
    let denominator =
        (BigUint::from(reserve_out) - BigUint::from(amount_out)) * BigUint::from(fee_num);

    let result = numerator / denominator + BigUint::from(1u32);
    result.to_u128()
}

/// Price impact as a percentage of the pre-trade spot price.
///
/// impact = 1 - (amount_out * reserve_in) / (amount_in * reserve_out),
/// computed by cross-multiplication in BigUint so extreme reserve ratios
/// do not lose precision before the final percentage conversion.
pub fn calculate_price_impact(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_in: Amount,
    amount_out: Amount,
) -> f64 {
    if reserve_in == 0 || reserve_out == 0 || amount_in == 0 || amount_out == 0 {
        return 0.0;
    }

    let spot_side = BigUint::from(amount_in) * BigUint::from(reserve_out);
    let exec_side = BigUint::from(amount_out) * BigUint::from(reserve_in);

    if exec_side >= spot_side {
        // Execution at or above spot can only come from rounding; report zero.
        return 0.0;
    }

    let deficit = &spot_side - &exec_side;
    let (Some(deficit), Some(spot_side)) = (deficit.to_f64(), spot_side.to_f64()) else {
        return 0.0;
    };
    deficit / spot_side * 100.0
}

/// Raw smallest-unit execution rate
pub fn calculate_execution_price(amount_in: Amount, amount_out: Amount) -> f64 {
    if amount_in == 0 {
        return 0.0;
    }
    amount_out as f64 / amount_in as f64
}

/// Apply a slippage tolerance to an output amount.
///
/// Always floors (in the protocol's favor): a rounded-up minimum could be
/// unreachable and force a needless revert. Tolerances are carried to
/// basis-point resolution.
pub fn apply_slippage(amount_out: Amount, slippage_pct: f64) -> Amount {
    let bps = pct_to_bps(slippage_pct);
    let kept = slippage::BPS_DENOM - bps;
    let result = BigUint::from(amount_out) * BigUint::from(kept) / BigUint::from(slippage::BPS_DENOM);
    result.to_u128().unwrap_or(0)
}

fn pct_to_bps(pct: f64) -> u128 {
    let bps = (pct * 100.0).round();
    if bps <= 0.0 {
        0
    } else if bps >= slippage::BPS_DENOM as f64 {
        slippage::BPS_DENOM
    } else {
        bps as u128
    }
}

/// Classify how deep the input-side reserve is relative to the trade
pub fn classify_depth(reserve_in: Amount, amount_in: Amount) -> LiquidityDepth {
    if amount_in == 0 {
        return LiquidityDepth::High;
    }
    match reserve_in / amount_in {
        m if m >= depth::HIGH_MULTIPLE => LiquidityDepth::High,
        m if m >= depth::MEDIUM_MULTIPLE => LiquidityDepth::Medium,
        _ => LiquidityDepth::Low,
    }
}

/// Compute a full quote against one pool snapshot.
///
/// Reserve orientation follows the pool token whose address matches
/// `token_in` (case-insensitive); a token matching neither side is
/// `UnknownToken`. An unseeded pool is `NoLiquidity` before any division
/// can happen. A zero input yields a zero quote rather than an error.
pub fn quote(
    pool: &PoolState,
    token_in: &TokenRef,
    amount_in: Amount,
    slippage_tiers: &[f64],
) -> Result<Quote, AmmError> {
    let (reserve_in, reserve_out) = pool
        .reserves_in_out(token_in)
        .ok_or_else(|| AmmError::UnknownToken(token_in.address.to_string()))?;

    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::NoLiquidity);
    }

    if amount_in == 0 {
        return Ok(Quote {
            amount_in: 0,
            amount_out: 0,
            price_impact_pct: 0.0,
            execution_price: 0.0,
            minimum_received: slippage_tiers
                .iter()
                .map(|&pct| SlippageTier {
                    pct,
                    minimum_received: 0,
                })
                .collect(),
            liquidity_depth: LiquidityDepth::High,
        });
    }

    let amount_out = calculate_output(
        reserve_in,
        reserve_out,
        amount_in,
        fees::FEE_NUM,
        fees::FEE_DENOM,
    );

    let minimum_received = slippage_tiers
        .iter()
        .map(|&pct| SlippageTier {
            pct,
            minimum_received: apply_slippage(amount_out, pct),
        })
        .collect();

    Ok(Quote {
        amount_in,
        amount_out,
        price_impact_pct: calculate_price_impact(reserve_in, reserve_out, amount_in, amount_out),
        execution_price: calculate_execution_price(amount_in, amount_out),
        minimum_received,
        liquidity_depth: classify_depth(reserve_in, amount_in),
    })
}
