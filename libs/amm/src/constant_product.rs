//! Constant-product (x*y=k) AMM math with exact integer calculations
//!
//! All intermediates are 256-bit, so reserves and amounts may use the full
//! `u128` range of 18-decimal assets without overflow. Every division
//! truncates except the reverse (input-for-output) calculation, which rounds
//! up so the returned input is always sufficient.

use crate::error::{AmmError, Result};
use primitive_types::U256;
use types::{mul_div, narrow, BasisPoints, FixedPointError, BPS_DENOMINATOR};

/// Constant-product math functions over raw reserves
pub struct ConstantProductMath;

impl ConstantProductMath {
    /// `amount_in * (10000 - fee_bps) / 10000`, truncating
    pub fn amount_in_after_fee(amount_in: u128, fee: BasisPoints) -> Result<u128> {
        let fee = BasisPoints::fee_rate(fee.get())?;
        Ok(mul_div(amount_in, fee.complement(), BPS_DENOMINATOR)?)
    }

    /// Exact output for `amount_in` using the x*y=k formula
    ///
    /// `out = reserve_out * in' / (reserve_in + in')` where `in'` is the
    /// input after the fee is taken.
    pub fn calculate_output_amount(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: BasisPoints,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(AmmError::ZeroInput);
        }
        Self::validate_reserves(reserve_in, reserve_out)?;

        let after_fee = Self::amount_in_after_fee(amount_in, fee)?;
        let numerator = U256::from(reserve_out) * U256::from(after_fee);
        let denominator = U256::from(reserve_in) + U256::from(after_fee);
        Ok(narrow(numerator / denominator, "constant product output")?)
    }

    /// Output at the pre-trade marginal rate `reserve_out / reserve_in`
    ///
    /// Upper bound on what the pool can return for `amount_in_after_fee`;
    /// the gap to the actual output is the slippage.
    pub fn spot_output(amount_in_after_fee: u128, reserve_in: u128, reserve_out: u128) -> Result<u128> {
        Self::validate_reserves(reserve_in, reserve_out)?;
        Ok(mul_div(amount_in_after_fee, reserve_out, reserve_in)?)
    }

    /// Marginal price movement caused by the swap, in basis points
    ///
    /// `pre = reserve_out / reserve_in`, `post = (reserve_out - out) /
    /// (reserve_in + in)`, impact `= (pre - post) / pre`, which reduces to
    /// `(reserve_out * in + out * reserve_in) / (reserve_out * (reserve_in + in))`.
    /// `in` is the full input, since the fee stays in the pool.
    pub fn calculate_price_impact(
        amount_in: u128,
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<BasisPoints> {
        Self::validate_reserves(reserve_in, reserve_out)?;
        if amount_out > reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                requested: amount_out,
                reserve_out,
            });
        }

        let overflow = || FixedPointError::Overflow { context: "price impact" };
        let moved_out = U256::from(reserve_out)
            .checked_mul(U256::from(amount_in))
            .ok_or_else(overflow)?;
        let moved_in = U256::from(amount_out)
            .checked_mul(U256::from(reserve_in))
            .ok_or_else(overflow)?;
        let numerator = moved_out.checked_add(moved_in).ok_or_else(overflow)?;
        let denominator = U256::from(reserve_out)
            .checked_mul(U256::from(reserve_in) + U256::from(amount_in))
            .ok_or_else(overflow)?;

        Ok(BasisPoints::from_ratio_wide(numerator, denominator)?)
    }

    /// `(reserve_in + in) * (reserve_out - out) >= reserve_in * reserve_out`
    pub fn preserves_invariant(
        amount_in: u128,
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> bool {
        if amount_out > reserve_out {
            return false;
        }
        let k_before = U256::from(reserve_in).full_mul(U256::from(reserve_out));
        let k_after = (U256::from(reserve_in) + U256::from(amount_in))
            .full_mul(U256::from(reserve_out - amount_out));
        k_after >= k_before
    }

    fn validate_reserves(reserve_in: u128, reserve_out: u128) -> Result<()> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::InvalidReserves {
                reserve_base: reserve_in,
                reserve_quote: reserve_out,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_output_matches_reference_pool() {
        // 1000 WETH : 1500 USDC, 30 bps, 1 WETH in
        let out = ConstantProductMath::calculate_output_amount(
            E18,
            1_000 * E18,
            1_500_000_000,
            BasisPoints::new(30),
        )
        .unwrap();
        assert_eq!(out, 1_494_010);
    }

    #[test]
    fn test_output_rejects_degenerate_inputs() {
        let fee = BasisPoints::new(30);
        assert_eq!(
            ConstantProductMath::calculate_output_amount(0, 1, 1, fee),
            Err(AmmError::ZeroInput)
        );
        assert!(matches!(
            ConstantProductMath::calculate_output_amount(1, 0, 1, fee),
            Err(AmmError::InvalidReserves { .. })
        ));
        assert!(matches!(
            ConstantProductMath::calculate_output_amount(1, 1, 1, BasisPoints::new(10_000)),
            Err(AmmError::Validation(_))
        ));
    }

    #[test]
    fn test_price_impact_reference_pool() {
        // in=1e18, out=1_494_010, reserves 1000e18 / 1500e6
        let impact = ConstantProductMath::calculate_price_impact(
            E18,
            1_494_010,
            1_000 * E18,
            1_500_000_000,
        )
        .unwrap();
        // (1500e6*1e18 + 1_494_010*1000e18) / (1500e6 * 1001e18) = 0.001994... -> 19 bps
        assert_eq!(impact, BasisPoints::new(19));
    }

    #[test]
    fn test_spot_output_bounds_actual() {
        let after_fee = ConstantProductMath::amount_in_after_fee(E18, BasisPoints::new(30)).unwrap();
        assert_eq!(after_fee, 997_000_000_000_000_000);
        let spot = ConstantProductMath::spot_output(after_fee, 1_000 * E18, 1_500_000_000).unwrap();
        assert_eq!(spot, 1_495_500);
    }

    proptest! {
        #[test]
        fn prop_swap_preserves_k(
            reserve_in in 1u128..=u128::MAX >> 8,
            reserve_out in 1u128..=u128::MAX >> 8,
            amount_in in 1u128..=u128::MAX >> 8,
            fee_bps in 0u32..10_000,
        ) {
            let out = ConstantProductMath::calculate_output_amount(
                amount_in, reserve_in, reserve_out, BasisPoints::new(fee_bps)
            ).unwrap();
            prop_assert!(out < reserve_out);
            prop_assert!(ConstantProductMath::preserves_invariant(amount_in, out, reserve_in, reserve_out));
        }

        #[test]
        fn prop_output_never_exceeds_spot(
            reserve_in in 1u128..=u64::MAX as u128,
            reserve_out in 1u128..=u64::MAX as u128,
            amount_in in 1u128..=u64::MAX as u128,
            fee_bps in 0u32..10_000,
        ) {
            let fee = BasisPoints::new(fee_bps);
            let after_fee = ConstantProductMath::amount_in_after_fee(amount_in, fee).unwrap();
            let out = ConstantProductMath::calculate_output_amount(amount_in, reserve_in, reserve_out, fee).unwrap();
            let spot = ConstantProductMath::spot_output(after_fee, reserve_in, reserve_out).unwrap();
            prop_assert!(out <= spot);
        }
    }
}
