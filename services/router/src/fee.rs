//! Protocol fee owed on a trade

use crate::error::Result;
use types::{mul_div, BasisPoints, BPS_DENOMINATOR};

/// Fee charged on a venue's input, in input-asset raw units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub fee_amount: u128,
    /// Input left after the fee
    pub net_amount_in: u128,
}

/// Stateless fee arithmetic shared by both venues
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeCalculator;

impl FeeCalculator {
    /// `amount_in * rate / 10000`, truncating
    ///
    /// Rates at or above 100% are rejected.
    pub fn calculate_fee(&self, amount_in: u128, rate: BasisPoints) -> Result<u128> {
        let rate = BasisPoints::fee_rate(rate.get())?;
        Ok(mul_div(amount_in, u128::from(rate.get()), BPS_DENOMINATOR)?)
    }

    pub fn split(&self, amount_in: u128, rate: BasisPoints) -> Result<FeeBreakdown> {
        let fee_amount = self.calculate_fee(amount_in, rate)?;
        Ok(FeeBreakdown {
            fee_amount,
            net_amount_in: amount_in - fee_amount,
        })
    }
}
