//! Constant-product pool snapshot

use crate::error::{AmmError, Result};
use crate::pool_traits::{AmmPool, PoolType};
use serde::{Deserialize, Serialize};
use types::{AssetPair, BasisPoints, PairLeg};

/// Reserves and fee of one pool, keyed by its canonical pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub pair: AssetPair,
    pub reserve_base: u128,
    pub reserve_quote: u128,
    pub fee: BasisPoints,
    pub last_update_ns: u64,
}

impl PoolState {
    /// Create a validated pool snapshot
    pub fn new(
        pair: AssetPair,
        reserve_base: u128,
        reserve_quote: u128,
        fee_bps: u32,
        last_update_ns: u64,
    ) -> Result<Self> {
        let state = Self {
            pair,
            reserve_base,
            reserve_quote,
            fee: BasisPoints::new(fee_bps),
            last_update_ns,
        };
        state.validate()?;
        Ok(state)
    }

    /// Reserves strictly positive, fee in `[0, 10000)`
    pub fn validate(&self) -> Result<()> {
        if self.reserve_base == 0 || self.reserve_quote == 0 {
            return Err(AmmError::InvalidReserves {
                reserve_base: self.reserve_base,
                reserve_quote: self.reserve_quote,
            });
        }
        BasisPoints::fee_rate(self.fee.get())?;
        Ok(())
    }
}

impl AmmPool for PoolState {
    fn pair(&self) -> &AssetPair {
        &self.pair
    }

    fn pool_type(&self) -> PoolType {
        PoolType::ConstantProduct
    }

    fn reserves_for(&self, token_in: &str) -> Result<(u128, u128)> {
        match self.pair.leg_of(token_in) {
            Some(PairLeg::Base) => Ok((self.reserve_base, self.reserve_quote)),
            Some(PairLeg::Quote) => Ok((self.reserve_quote, self.reserve_base)),
            None => Err(AmmError::UnknownAsset {
                asset: token_in.to_string(),
                pair: self.pair.clone(),
            }),
        }
    }

    fn get_liquidity(&self) -> (u128, u128) {
        (self.reserve_base, self.reserve_quote)
    }

    fn fee(&self) -> BasisPoints {
        self.fee
    }
}
