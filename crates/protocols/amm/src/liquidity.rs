//! Liquidity math
//!
//! Pure projections of what the pair contract would mint or release. These
//! never mutate pool state; the on-chain call performs the authoritative
//! accounting.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use tidepool_core::{Amount, TokenRef};

use crate::state::{AmmError, LiquidityPreview, PoolState, RemovePreview};

/// Initial LP mint for a fresh pool: geometric mean of the two deposits.
///
/// Uses BigUint since amount_a * amount_b can exceed u128.
pub fn initial_lp_mint(amount_a: Amount, amount_b: Amount) -> Amount {
    if amount_a == 0 || amount_b == 0 {
        return 0;
    }
    let product = BigUint::from(amount_a) * BigUint::from(amount_b);
    product.sqrt().to_u128().unwrap_or(u128::MAX)
}

/// LP mint against an existing pool.
///
/// mint = min(amount_a * supply / reserve_a, amount_b * supply / reserve_b)
///
/// The minimum models the pair's actual minting rule: an imbalanced
/// deposit is credited only for its limiting side. Correcting the other
/// amount to the spot ratio is a presentation concern, see
/// [`counterpart_amount`].
pub fn lp_mint(
    reserve_a: Amount,
    reserve_b: Amount,
    total_supply: Amount,
    amount_a: Amount,
    amount_b: Amount,
) -> Amount {
    if reserve_a == 0 || reserve_b == 0 || total_supply == 0 {
        return 0;
    }
    let mint_a = BigUint::from(amount_a) * BigUint::from(total_supply) / BigUint::from(reserve_a);
    let mint_b = BigUint::from(amount_b) * BigUint::from(total_supply) / BigUint::from(reserve_b);
    mint_a.min(mint_b).to_u128().unwrap_or(0)
}

/// Pool share percentage after a mint of `lp_minted` on top of `total_supply`
pub fn share_of_pool_pct(lp_minted: Amount, total_supply: Amount) -> f64 {
    let denominator = total_supply.saturating_add(lp_minted);
    if denominator == 0 {
        return 0.0;
    }
    lp_minted as f64 / denominator as f64 * 100.0
}

/// Preview an add-liquidity deposit.
///
/// A missing pool or a zero LP supply means the depositor seeds the pool:
/// geometric-mean mint and 100% ownership. Otherwise amounts are oriented
/// against the pool by `token_a`'s address before the min-ratio mint.
pub fn preview_add_liquidity(
    pool: Option<&PoolState>,
    token_a: &TokenRef,
    amount_a: Amount,
    amount_b: Amount,
) -> Result<LiquidityPreview, AmmError> {
    let pool = match pool {
        Some(p) if p.total_supply > 0 => p,
        _ => {
            return Ok(LiquidityPreview {
                lp_minted: initial_lp_mint(amount_a, amount_b),
                share_of_pool_pct: 100.0,
            });
        }
    };

    let (reserve_a, reserve_b) = pool
        .reserves_in_out(token_a)
        .ok_or_else(|| AmmError::UnknownToken(token_a.address.to_string()))?;

    if reserve_a == 0 || reserve_b == 0 {
        return Err(AmmError::NoLiquidity);
    }

    let lp_minted = lp_mint(reserve_a, reserve_b, pool.total_supply, amount_a, amount_b);

    Ok(LiquidityPreview {
        lp_minted,
        share_of_pool_pct: share_of_pool_pct(lp_minted, pool.total_supply),
    })
}

/// Preview redeeming `lp_amount` LP tokens for the pro-rata share of both
/// reserves. Floors both sides.
pub fn preview_remove_liquidity(
    pool: &PoolState,
    lp_amount: Amount,
) -> Result<RemovePreview, AmmError> {
    if pool.total_supply == 0 {
        return Err(AmmError::NoLiquidity);
    }

    let supply = BigUint::from(pool.total_supply);
    let amount0 = BigUint::from(lp_amount) * BigUint::from(pool.reserve0) / &supply;
    let amount1 = BigUint::from(lp_amount) * BigUint::from(pool.reserve1) / &supply;

    Ok(RemovePreview {
        amount0: amount0.to_u128().unwrap_or(0),
        amount1: amount1.to_u128().unwrap_or(0),
    })
}

/// Spot-price-matched amount of the *other* pool token for a desired
/// deposit of `amount_in` of `token_in`.
pub fn counterpart_amount(
    pool: &PoolState,
    token_in: &TokenRef,
    amount_in: Amount,
) -> Result<Amount, AmmError> {
    let (reserve_in, reserve_out) = pool
        .reserves_in_out(token_in)
        .ok_or_else(|| AmmError::UnknownToken(token_in.address.to_string()))?;

    if reserve_in == 0 {
        return Err(AmmError::NoLiquidity);
    }

    let needed = BigUint::from(amount_in) * BigUint::from(reserve_out) / BigUint::from(reserve_in);
    Ok(needed.to_u128().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::Address;

    fn token_a() -> TokenRef {
        TokenRef::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "AAA", 18)
    }

    fn token_b() -> TokenRef {
        TokenRef::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "BBB", 18)
    }

    fn pool(reserve0: Amount, reserve1: Amount, total_supply: Amount) -> PoolState {
        PoolState {
            pair_address: Address::new("0xcccccccccccccccccccccccccccccccccccccccc"),
            token0: token_a(),
            token1: token_b(),
            reserve0,
            reserve1,
            total_supply,
        }
    }

    #[test]
    fn test_fresh_pool_geometric_mean() {
        let preview = preview_add_liquidity(None, &token_a(), 100, 400).unwrap();
        assert_eq!(preview.lp_minted, 200);
        assert_eq!(preview.share_of_pool_pct, 100.0);
    }

    #[test]
    fn test_zero_supply_pool_counts_as_fresh() {
        let p = pool(0, 0, 0);
        let preview = preview_add_liquidity(Some(&p), &token_a(), 100, 400).unwrap();
        assert_eq!(preview.lp_minted, 200);
        assert_eq!(preview.share_of_pool_pct, 100.0);
    }

    #[test]
    fn test_initial_mint_zero_side() {
        assert_eq!(initial_lp_mint(0, 1_000), 0);
        assert_eq!(initial_lp_mint(1_000, 0), 0);
    }

    #[test]
    fn test_initial_mint_overflow_safe() {
        let result = initial_lp_mint(u128::MAX / 2, u128::MAX / 2);
        assert!(result > 0);
    }

    #[test]
    fn test_existing_pool_balanced_deposit() {
        let p = pool(1_000, 2_000, 1_000);
        let preview = preview_add_liquidity(Some(&p), &token_a(), 50, 100).unwrap();
        assert_eq!(preview.lp_minted, 50);
        // 50 / 1050 * 100 = 4.7619...
        assert!((preview.share_of_pool_pct - 4.761904761904762).abs() < 1e-9);
    }

    #[test]
    fn test_imbalanced_deposit_credits_limiting_side() {
        let p = pool(1_000, 2_000, 1_000);
        // Double the B amount; mint is still limited by the A side
        let balanced = preview_add_liquidity(Some(&p), &token_a(), 50, 100).unwrap();
        let imbalanced = preview_add_liquidity(Some(&p), &token_a(), 50, 200).unwrap();
        assert_eq!(balanced.lp_minted, imbalanced.lp_minted);
    }

    #[test]
    fn test_deposit_orientation_follows_token() {
        let p = pool(1_000, 2_000, 1_000);
        // Same deposit expressed from token_b's perspective
        let from_a = preview_add_liquidity(Some(&p), &token_a(), 50, 100).unwrap();
        let from_b = preview_add_liquidity(Some(&p), &token_b(), 100, 50).unwrap();
        assert_eq!(from_a.lp_minted, from_b.lp_minted);
    }

    #[test]
    fn test_deposit_unknown_token() {
        let p = pool(1_000, 2_000, 1_000);
        let other = TokenRef::new("0xdddddddddddddddddddddddddddddddddddddddd", "DDD", 18);
        assert!(matches!(
            preview_add_liquidity(Some(&p), &other, 50, 100),
            Err(AmmError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_remove_preview_pro_rata() {
        let p = pool(100_000, 10_000, 5_000);
        let preview = preview_remove_liquidity(&p, 500).unwrap();
        assert_eq!(preview.amount0, 10_000);
        assert_eq!(preview.amount1, 1_000);
    }

    #[test]
    fn test_remove_preview_zero_supply() {
        let p = pool(100, 200, 0);
        assert!(matches!(
            preview_remove_liquidity(&p, 50),
            Err(AmmError::NoLiquidity)
        ));
    }

    #[test]
    fn test_counterpart_amount_follows_spot() {
        let p = pool(100_000, 10_000, 5_000);
        assert_eq!(counterpart_amount(&p, &token_a(), 10_000).unwrap(), 1_000);
        assert_eq!(counterpart_amount(&p, &token_b(), 1_000).unwrap(), 10_000);
    }

    #[test]
    fn test_counterpart_unseeded() {
        let p = pool(0, 10_000, 5_000);
        assert!(matches!(
            counterpart_amount(&p, &token_a(), 10),
            Err(AmmError::NoLiquidity)
        ));
    }
}
