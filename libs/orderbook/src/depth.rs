//! Aggregated price levels and taker-fill simulation
//!
//! A [`DepthSnapshot`] is copied out of a book under its read lock, so a
//! fill can be priced without holding the lock and without mutating the book.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use types::{mul_div, AssetPair, BasisPoints, FixedPointError, MakerFill, OrderId, Price, Side};

/// Open interest resting at one price
///
/// `base_amount` is what the level buys or sells in base units.
/// `quote_amount` is the quote a taker receives from a bid level, or must pay
/// to clear an ask level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub base_amount: u128,
    pub quote_amount: u128,
    pub order_count: usize,
}

/// An open order waiting in a level's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    /// Maker input still unfilled
    pub remaining_in: u128,
}

/// Levels of the side a taker would consume, best first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSnapshot {
    pub pair: AssetPair,
    /// Resting side being consumed
    pub side: Side,
    pub levels: Vec<PriceLevel>,
    /// Open orders of each level in time priority, index-aligned with
    /// `levels`. Empty when the snapshot only carries aggregates.
    pub queues: Vec<Vec<RestingOrder>>,
    pub taker_fee: BasisPoints,
    pub taken_at_ns: u64,
}

/// Outcome of walking a depth snapshot with a fee-adjusted input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakerFill {
    pub amount_in: u128,
    pub amount_out: u128,
    /// Output had the whole input filled at the best level
    pub ideal_amount_out: u128,
    pub best_price: Price,
    pub levels_consumed: usize,
    /// Relative gap between the best price and the fill's average price
    pub price_impact: BasisPoints,
    /// Resting orders consumed, front of each queue first
    pub maker_fills: Vec<MakerFill>,
}

impl DepthSnapshot {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn best_price(&self) -> Option<Price> {
        self.levels.first().map(|level| level.price)
    }

    /// Walk the levels with `amount_in` of the taker's asset
    ///
    /// Returns `None` when the side is empty or cannot absorb the whole
    /// input; partial fills are not quoted.
    pub fn simulate_taker_fill(&self, amount_in: u128) -> Result<Option<TakerFill>, FixedPointError> {
        let Some(best_price) = self.best_price() else {
            return Ok(None);
        };
        if amount_in == 0 {
            return Ok(None);
        }

        let mut remaining = amount_in;
        let mut amount_out = 0u128;
        let mut levels_consumed = 0usize;
        let mut maker_fills = Vec::new();

        for (index, level) in self.levels.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(self.input_capacity(level));
            if take == 0 {
                continue;
            }
            let out = match self.side {
                Side::Bid => mul_div(take, level.price.raw(), Price::SCALE)?.min(level.quote_amount),
                Side::Ask => mul_div(take, Price::SCALE, level.price.raw())?.min(level.base_amount),
            };
            amount_out = amount_out
                .checked_add(out)
                .ok_or(FixedPointError::Overflow { context: "taker fill output" })?;
            remaining -= take;
            levels_consumed += 1;

            // The taker's output is the makers' input, drawn from the queue front
            if let Some(queue) = self.queues.get(index) {
                let mut left = out;
                for resting in queue {
                    if left == 0 {
                        break;
                    }
                    let filled_in = left.min(resting.remaining_in);
                    if filled_in > 0 {
                        maker_fills.push(MakerFill { order_id: resting.order_id, filled_in });
                        left -= filled_in;
                    }
                }
            }
        }

        if remaining > 0 {
            return Ok(None);
        }

        let ideal_amount_out = match self.side {
            Side::Bid => best_price.quote_for_base(amount_in)?,
            Side::Ask => best_price.base_for_quote(amount_in)?,
        };
        let price_impact = if levels_consumed <= 1 {
            BasisPoints::ZERO
        } else {
            self.vwap_deviation(amount_in, amount_out, best_price)?
        };

        Ok(Some(TakerFill {
            amount_in,
            amount_out,
            ideal_amount_out,
            best_price,
            levels_consumed,
            price_impact,
            maker_fills,
        }))
    }

    fn input_capacity(&self, level: &PriceLevel) -> u128 {
        match self.side {
            Side::Bid => level.base_amount,
            Side::Ask => level.quote_amount,
        }
    }

    /// `|vwap - best| / best` where vwap is quote per base of the fill
    fn vwap_deviation(
        &self,
        amount_in: u128,
        amount_out: u128,
        best_price: Price,
    ) -> Result<BasisPoints, FixedPointError> {
        let scale = U256::from(Price::SCALE);
        let best = U256::from(best_price.raw());
        match self.side {
            // vwap = out * S / in, below best
            Side::Bid => {
                let at_best = U256::from(amount_in) * best;
                let realized = U256::from(amount_out) * scale;
                BasisPoints::from_ratio_wide(at_best.saturating_sub(realized), at_best)
            }
            // vwap = in * S / out, above best
            Side::Ask => {
                if amount_out == 0 {
                    return Ok(BasisPoints::new(BasisPoints::MAX));
                }
                let paid = U256::from(amount_in) * scale;
                let at_best = U256::from(amount_out) * best;
                BasisPoints::from_ratio_wide(paid.saturating_sub(at_best), at_best)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn level(price: u128, base_amount: u128, quote_amount: u128) -> PriceLevel {
        PriceLevel {
            price: Price::from_raw(price),
            base_amount,
            quote_amount,
            order_count: 1,
        }
    }

    fn snapshot(side: Side, levels: Vec<PriceLevel>) -> DepthSnapshot {
        DepthSnapshot {
            pair: AssetPair::canonical("0x1234", "0x9876").unwrap(),
            side,
            levels,
            queues: Vec::new(),
            taker_fee: BasisPoints::new(25),
            taken_at_ns: 0,
        }
    }

    #[test]
    fn test_single_level_fill_has_no_impact() {
        // Bid for 10 base at 1.5 quote (6 decimals) per 1e18 base
        let book = snapshot(Side::Bid, vec![level(1_500_000, 10 * E18, 15_000_000)]);
        let net_in = E18 - 2_500_000_000_000_000;
        let fill = book.simulate_taker_fill(net_in).unwrap().unwrap();
        assert_eq!(fill.amount_out, 1_496_250);
        assert_eq!(fill.ideal_amount_out, 1_496_250);
        assert_eq!(fill.levels_consumed, 1);
        assert_eq!(fill.price_impact, BasisPoints::ZERO);
    }

    #[test]
    fn test_walks_bid_levels_best_first() {
        let book = snapshot(
            Side::Bid,
            vec![level(2_000_000, E18, 2_000_000), level(1_000_000, E18, 1_000_000)],
        );
        let fill = book.simulate_taker_fill(2 * E18).unwrap().unwrap();
        assert_eq!(fill.amount_out, 3_000_000);
        assert_eq!(fill.ideal_amount_out, 4_000_000);
        assert_eq!(fill.levels_consumed, 2);
        // vwap 1.5 vs best 2.0
        assert_eq!(fill.price_impact, BasisPoints::new(2_500));
    }

    #[test]
    fn test_walks_ask_levels_best_first() {
        let book = snapshot(
            Side::Ask,
            vec![level(1_000_000, E18, 1_000_000), level(2_000_000, E18, 2_000_000)],
        );
        let fill = book.simulate_taker_fill(3_000_000).unwrap().unwrap();
        assert_eq!(fill.amount_out, 2 * E18);
        assert_eq!(fill.ideal_amount_out, 3 * E18);
        // vwap 1.5 vs best 1.0
        assert_eq!(fill.price_impact, BasisPoints::new(5_000));
    }

    #[test]
    fn test_insufficient_depth_is_none() {
        let book = snapshot(Side::Bid, vec![level(1_000_000, E18, 1_000_000)]);
        assert!(book.simulate_taker_fill(E18).unwrap().is_some());
        assert_eq!(book.simulate_taker_fill(E18 + 1).unwrap(), None);
        assert_eq!(snapshot(Side::Ask, vec![]).simulate_taker_fill(1).unwrap(), None);
    }

    #[test]
    fn test_maker_fills_follow_queue_order() {
        let mut book = snapshot(
            Side::Ask,
            vec![level(1_000_000, 3 * E18, 3_000_000), level(2_000_000, E18, 2_000_000)],
        );
        let resting = |id: u64, remaining_in: u128| RestingOrder {
            order_id: OrderId::new(id),
            remaining_in,
        };
        book.queues = vec![
            vec![resting(7, E18), resting(3, 2 * E18)],
            vec![resting(9, E18)],
        ];

        // Clears the 1.0 level (3 base) and buys 0.25 base at 2.0
        let fill = book.simulate_taker_fill(3_500_000).unwrap().unwrap();
        assert_eq!(fill.amount_out, 3 * E18 + E18 / 4);
        let fills: Vec<(u64, u128)> = fill
            .maker_fills
            .iter()
            .map(|f| (f.order_id.inner(), f.filled_in))
            .collect();
        assert_eq!(fills, vec![(7, E18), (3, 2 * E18), (9, E18 / 4)]);

        // Partial first level touches only the queue front
        let fill = book.simulate_taker_fill(500_000).unwrap().unwrap();
        assert_eq!(fill.maker_fills, vec![MakerFill { order_id: OrderId::new(7), filled_in: E18 / 2 }]);
    }
}
