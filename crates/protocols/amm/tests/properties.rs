//! Property-based tests for the constant-product curve and its derived
//! figures: output bounds, monotonicity, fee erosion on round trips,
//! minimum-received ordering, and LP share bounds.

use proptest::prelude::*;

use amm::calculator::{
    apply_slippage, calculate_output, calculate_price_impact,
};
use amm::liquidity::{initial_lp_mint, lp_mint, share_of_pool_pct};

const FEE_NUM: u32 = 997;
const FEE_DENOM: u32 = 1000;

prop_compose! {
    /// Reserves wide enough for 18-decimal tokens, never empty
    fn reserves()(r0 in 1_000u128..=10u128.pow(30), r1 in 1_000u128..=10u128.pow(30)) -> (u128, u128) {
        (r0, r1)
    }
}

proptest! {
    #[test]
    fn output_never_drains_the_out_reserve(
        (reserve_in, reserve_out) in reserves(),
        amount_in in 1u128..=10u128.pow(27),
    ) {
        let out = calculate_output(reserve_in, reserve_out, amount_in, FEE_NUM, FEE_DENOM);
        prop_assert!(out < reserve_out);
    }

    #[test]
    fn output_is_monotonic_in_input(
        (reserve_in, reserve_out) in reserves(),
        amount_in in 1u128..=10u128.pow(26),
        delta in 1u128..=10u128.pow(26),
    ) {
        let smaller = calculate_output(reserve_in, reserve_out, amount_in, FEE_NUM, FEE_DENOM);
        let larger = calculate_output(reserve_in, reserve_out, amount_in + delta, FEE_NUM, FEE_DENOM);
        prop_assert!(larger >= smaller);
    }

    #[test]
    fn round_trip_never_profits(
        (reserve_in, reserve_out) in reserves(),
        amount_in in 1u128..=10u128.pow(26),
    ) {
        let out = calculate_output(reserve_in, reserve_out, amount_in, FEE_NUM, FEE_DENOM);
        // Swap the proceeds back against the post-trade reserves
        let back = calculate_output(
            reserve_out - out,
            reserve_in + amount_in,
            out,
            FEE_NUM,
            FEE_DENOM,
        );
        prop_assert!(back <= amount_in, "round trip minted value: {back} > {amount_in}");
    }

    #[test]
    fn price_impact_is_a_sane_percentage(
        (reserve_in, reserve_out) in reserves(),
        amount_in in 1u128..=10u128.pow(27),
    ) {
        let out = calculate_output(reserve_in, reserve_out, amount_in, FEE_NUM, FEE_DENOM);
        let impact = calculate_price_impact(reserve_in, reserve_out, amount_in, out);
        prop_assert!(impact.is_finite());
        prop_assert!((0.0..=100.0).contains(&impact), "impact {impact}");
    }

    #[test]
    fn tighter_slippage_guarantees_at_least_as_much(
        amount_out in 0u128..=10u128.pow(30),
        s1 in 0.0f64..=50.0,
        s2 in 0.0f64..=50.0,
    ) {
        let (tight, loose) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
        prop_assert!(apply_slippage(amount_out, tight) >= apply_slippage(amount_out, loose));
    }

    #[test]
    fn minimum_received_never_exceeds_quoted_output(
        amount_out in 0u128..=10u128.pow(30),
        s in 0.0f64..=50.0,
    ) {
        prop_assert!(apply_slippage(amount_out, s) <= amount_out);
    }

    #[test]
    fn fresh_pool_mint_is_geometric_mean_bounded(
        amount_a in 1u128..=10u128.pow(30),
        amount_b in 1u128..=10u128.pow(30),
    ) {
        let minted = initial_lp_mint(amount_a, amount_b);
        // sqrt(a*b) lies between min(a,b) and max(a,b)
        prop_assert!(minted >= amount_a.min(amount_b));
        prop_assert!(minted <= amount_a.max(amount_b));
    }

    #[test]
    fn pool_share_is_a_valid_percentage(
        (reserve_a, reserve_b) in reserves(),
        supply in 1u128..=10u128.pow(27),
        amount_a in 1u128..=10u128.pow(27),
        amount_b in 1u128..=10u128.pow(27),
    ) {
        let minted = lp_mint(reserve_a, reserve_b, supply, amount_a, amount_b);
        let share = share_of_pool_pct(minted, supply);
        prop_assert!((0.0..=100.0).contains(&share), "share {share}");
    }
}
