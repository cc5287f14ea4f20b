//! Pool trait definitions for a unified AMM interface

use crate::constant_product::ConstantProductMath;
use crate::error::{AmmError, Result};
use serde::{Deserialize, Serialize};
use types::{AssetPair, BasisPoints, Price};

/// Pricing curve of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    #[default]
    ConstantProduct,
}

/// Result of pricing a swap against a pool snapshot. Reserves are not
/// mutated; `reserve_*_after` describe the hypothetical post-trade pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSimulation {
    pub amount_in: u128,
    pub amount_in_after_fee: u128,
    pub amount_out: u128,
    /// Output at the pre-trade marginal rate for the same fee-adjusted input
    pub spot_amount_out: u128,
    pub price_impact: BasisPoints,
    pub reserve_in_after: u128,
    pub reserve_out_after: u128,
}

/// Unified pool interface for routing calculations
pub trait AmmPool {
    fn pair(&self) -> &AssetPair;

    fn pool_type(&self) -> PoolType;

    /// `(reserve_in, reserve_out)` as seen by a taker giving up `token_in`
    fn reserves_for(&self, token_in: &str) -> Result<(u128, u128)>;

    /// `(reserve_base, reserve_quote)`
    fn get_liquidity(&self) -> (u128, u128);

    fn fee(&self) -> BasisPoints;

    fn get_fee_bps(&self) -> u32 {
        self.fee().get()
    }

    /// Marginal quote-per-base price `reserve_quote / reserve_base`
    fn spot_price(&self) -> Result<Price> {
        let (reserve_base, reserve_quote) = self.get_liquidity();
        Ok(Price::from_ratio(reserve_quote, reserve_base)?)
    }

    /// Calculate output amount for given input
    fn get_amount_out(&self, token_in: &str, amount_in: u128) -> Result<u128> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        ConstantProductMath::calculate_output_amount(amount_in, reserve_in, reserve_out, self.fee())
    }

    /// Price a swap without touching the pool
    fn simulate_swap(&self, token_in: &str, amount_in: u128) -> Result<SwapSimulation> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        let fee = self.fee();
        let amount_out =
            ConstantProductMath::calculate_output_amount(amount_in, reserve_in, reserve_out, fee)?;
        if !ConstantProductMath::preserves_invariant(amount_in, amount_out, reserve_in, reserve_out) {
            return Err(AmmError::InvariantViolation { amount_in, amount_out });
        }
        let amount_in_after_fee = ConstantProductMath::amount_in_after_fee(amount_in, fee)?;
        let spot_amount_out =
            ConstantProductMath::spot_output(amount_in_after_fee, reserve_in, reserve_out)?;
        let price_impact =
            ConstantProductMath::calculate_price_impact(amount_in, amount_out, reserve_in, reserve_out)?;

        Ok(SwapSimulation {
            amount_in,
            amount_in_after_fee,
            amount_out,
            spot_amount_out,
            price_impact,
            reserve_in_after: reserve_in.saturating_add(amount_in),
            reserve_out_after: reserve_out - amount_out,
        })
    }
}
