//! Slippage, tolerance and gas estimation for a candidate execution
//!
//! Slippage compares the realized output with the output the same
//! fee-adjusted input would have fetched at the venue's pre-trade best rate
//! (the marginal pool price, or the best resting level). Price impact comes
//! from the venue itself since only the venue knows its curve or depth.

use crate::error::{Result, RouterError};
use config::GasConfig;
use primitive_types::U256;
use types::{BasisPoints, Route, SwapQuote};

/// Cost figures attached to a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    pub slippage_bps: u32,
    pub price_impact_bps: u32,
    pub exceeds_tolerance: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CostEstimator;

impl CostEstimator {
    /// `(expected - actual) * 10000 / expected`, floored at 0
    ///
    /// Returns 0 when nothing was expected or execution matched or beat it.
    pub fn slippage_bps(&self, expected_out: u128, actual_out: u128) -> Result<u32> {
        if expected_out == 0 || actual_out >= expected_out {
            return Ok(0);
        }
        let shortfall = U256::from(expected_out - actual_out);
        Ok(BasisPoints::from_ratio_wide(shortfall, U256::from(expected_out))?.get())
    }

    /// Soft tolerance: `None` never exceeds
    pub fn exceeds_tolerance(&self, slippage_bps: u32, max_slippage_bps: Option<u32>) -> bool {
        matches!(max_slippage_bps, Some(max) if slippage_bps > max)
    }

    pub fn estimate(
        &self,
        expected_out: u128,
        actual_out: u128,
        price_impact: BasisPoints,
        max_slippage_bps: Option<u32>,
    ) -> Result<CostEstimate> {
        let slippage_bps = self.slippage_bps(expected_out, actual_out)?;
        Ok(CostEstimate {
            slippage_bps,
            price_impact_bps: price_impact.get(),
            exceeds_tolerance: self.exceeds_tolerance(slippage_bps, max_slippage_bps),
        })
    }
}

/// Gas units for settling a route, derived from the path walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasModel {
    pub amm_swap: u64,
    pub order_book_base: u64,
    pub order_book_per_level: u64,
}

impl GasModel {
    pub fn estimate(&self, route: Route, levels_consumed: usize) -> u64 {
        match route {
            Route::Amm => self.amm_swap,
            Route::OrderBook => {
                let levels = u64::try_from(levels_consumed).unwrap_or(u64::MAX);
                self.order_book_base
                    .saturating_add(self.order_book_per_level.saturating_mul(levels))
            }
        }
    }
}

impl From<&GasConfig> for GasModel {
    fn from(config: &GasConfig) -> Self {
        Self {
            amm_swap: config.amm_swap,
            order_book_base: config.order_book_base,
            order_book_per_level: config.order_book_per_level,
        }
    }
}

/// Hard slippage check for callers that treat the soft flag as fatal
pub trait ToleranceCheck {
    fn ensure_within_tolerance(&self) -> Result<()>;
}

impl ToleranceCheck for SwapQuote {
    fn ensure_within_tolerance(&self) -> Result<()> {
        match self.max_slippage_bps {
            Some(max_slippage_bps) if self.slippage_bps > max_slippage_bps => {
                Err(RouterError::ExceedsSlippageTolerance {
                    slippage_bps: self.slippage_bps,
                    max_slippage_bps,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use types::{AssetPair, QuoteId};

    #[test]
    fn test_amm_scenario_slippage() {
        // spot 1_495_500, realized 1_494_010
        let slippage = CostEstimator.slippage_bps(1_495_500, 1_494_010).unwrap();
        assert_eq!(slippage, 9);
    }

    #[test]
    fn test_favourable_execution_is_zero() {
        assert_eq!(CostEstimator.slippage_bps(1_000, 1_000).unwrap(), 0);
        assert_eq!(CostEstimator.slippage_bps(1_000, 1_200).unwrap(), 0);
        assert_eq!(CostEstimator.slippage_bps(0, 5).unwrap(), 0);
    }

    #[test]
    fn test_tolerance_flag() {
        let estimate = CostEstimator
            .estimate(10_000, 9_900, BasisPoints::new(40), Some(50))
            .unwrap();
        assert_eq!(estimate.slippage_bps, 100);
        assert_eq!(estimate.price_impact_bps, 40);
        assert!(estimate.exceeds_tolerance);
        assert!(!CostEstimator.exceeds_tolerance(100, None));
        assert!(!CostEstimator.exceeds_tolerance(100, Some(100)));
    }

    #[test]
    fn test_gas_grows_with_levels() {
        let gas = GasModel::from(&GasConfig::default());
        assert_eq!(gas.estimate(Route::Amm, 0), gas.amm_swap);
        assert_eq!(gas.estimate(Route::OrderBook, 1), gas.order_book_base + gas.order_book_per_level);
        assert!(gas.estimate(Route::OrderBook, 3) > gas.estimate(Route::OrderBook, 2));
    }

    #[test]
    fn test_ensure_within_tolerance() {
        let mut quote = SwapQuote {
            quote_id: QuoteId::new(1),
            pair: AssetPair::canonical("a", "b").unwrap(),
            token_in: "a".into(),
            token_out: "b".into(),
            amount_in: 100,
            amount_out: 90,
            net_amount_out: 90,
            fee_amount: 0,
            fee_rate: BasisPoints::ZERO,
            route: Route::Amm,
            slippage_bps: 120,
            price_impact_bps: 0,
            gas_estimate: 0,
            exceeds_slippage_tolerance: true,
            max_slippage_bps: Some(100),
            alternative: None,
            maker_fills: Vec::new(),
            quoted_at_ns: 0,
            valid_until_ns: 0,
        };
        assert_eq!(
            quote.ensure_within_tolerance(),
            Err(RouterError::ExceedsSlippageTolerance { slippage_bps: 120, max_slippage_bps: 100 })
        );
        quote.max_slippage_bps = None;
        assert!(quote.ensure_within_tolerance().is_ok());
    }

    proptest! {
        #[test]
        fn prop_slippage_bounded(expected in 0u128..u128::MAX / 2, actual in 0u128..u128::MAX / 2) {
            let slippage = CostEstimator.slippage_bps(expected, actual).unwrap();
            prop_assert!(slippage <= BasisPoints::MAX);
            if actual >= expected {
                prop_assert_eq!(slippage, 0);
            }
        }
    }
}
