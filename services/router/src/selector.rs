//! Route selection across the order book and the AMM
//!
//! Both venues are queried concurrently, each under its own timeout. A venue
//! that errors or times out is dropped (fail-open) and the survivor is used.
//! The venue with the larger net output wins; ties go to the order book.
//!
//! A venue that answered but whose answer cannot be priced (arithmetic
//! overflow, a pool that does not hold the input asset) is rejected rather
//! than failed: retrying the same request would hit the same error.

use crate::error::{Result, RouterError};
use crate::fee::FeeCalculator;
use crate::venues::{AmmVenue, OrderBookVenue, VenueError};
use amm::{AmmPool, PoolState};
use orderbook::DepthSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use types::{AssetPair, BasisPoints, MakerFill, Route};

/// One venue's priced answer to a swap request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueQuote {
    pub route: Route,
    pub amount_in: u128,
    pub fee_amount: u128,
    pub fee_rate: BasisPoints,
    /// Venue output for the whole of `amount_in`, before any taker fee
    pub amount_out: u128,
    /// What the taker receives once fees are taken
    pub net_amount_out: u128,
    /// Output of the fee-adjusted input at the pre-trade best rate
    pub expected_out: u128,
    pub price_impact: BasisPoints,
    pub levels_consumed: usize,
    /// Resting orders the net fill draws on, in matching priority
    pub maker_fills: Vec<MakerFill>,
}

/// What one venue contributed to a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueOutcome {
    Priced(VenueQuote),
    /// No liquidity, or not enough to fill the request
    Absent,
    Failed(VenueError),
    /// Answered, but the request cannot be priced on this venue
    Rejected(RouterError),
}

impl VenueOutcome {
    fn quote(&self) -> Option<&VenueQuote> {
        match self {
            VenueOutcome::Priced(quote) => Some(quote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub best: VenueQuote,
    pub alternative: Option<VenueQuote>,
}

pub struct RouteSelector {
    order_book: Arc<dyn OrderBookVenue>,
    amm: Arc<dyn AmmVenue>,
    venue_timeout: Duration,
    fees: FeeCalculator,
}

impl RouteSelector {
    pub fn new(
        order_book: Arc<dyn OrderBookVenue>,
        amm: Arc<dyn AmmVenue>,
        venue_timeout: Duration,
    ) -> Self {
        Self {
            order_book,
            amm,
            venue_timeout,
            fees: FeeCalculator,
        }
    }

    pub fn venue_timeout(&self) -> Duration {
        self.venue_timeout
    }

    /// Query both venues and pick the better net output
    pub async fn select(&self, pair: &AssetPair, token_in: &str, amount_in: u128) -> Result<Selection> {
        let (book, amm) = tokio::join!(
            self.query_order_book(pair, token_in, amount_in),
            self.query_amm(pair, token_in, amount_in),
        );
        debug!(%pair, ?book, ?amm, "venue outcomes");
        decide(pair, book, amm)
    }

    async fn query_order_book(&self, pair: &AssetPair, token_in: &str, amount_in: u128) -> VenueOutcome {
        let venue = self.order_book.name();
        match timeout(self.venue_timeout, self.order_book.taker_depth(pair, token_in)).await {
            Ok(Ok(Some(depth))) => match self.price_order_book(&depth, amount_in) {
                Ok(Some(quote)) => VenueOutcome::Priced(quote),
                Ok(None) => VenueOutcome::Absent,
                Err(e) => {
                    warn!(%pair, venue, error = %e, "order book pricing rejected");
                    VenueOutcome::Rejected(e)
                }
            },
            Ok(Ok(None)) => VenueOutcome::Absent,
            Ok(Err(e)) => {
                warn!(%pair, venue, error = %e, "order book query failed");
                VenueOutcome::Failed(e)
            }
            Err(_) => {
                warn!(%pair, venue, timeout_ms = self.timeout_ms(), "order book query timed out");
                VenueOutcome::Failed(VenueError::Timeout { venue, after_ms: self.timeout_ms() })
            }
        }
    }

    async fn query_amm(&self, pair: &AssetPair, token_in: &str, amount_in: u128) -> VenueOutcome {
        let venue = self.amm.name();
        match timeout(self.venue_timeout, self.amm.pool(pair)).await {
            Ok(Ok(Some(pool))) => match self.price_amm(&pool, token_in, amount_in) {
                Ok(Some(quote)) => VenueOutcome::Priced(quote),
                Ok(None) => VenueOutcome::Absent,
                Err(e) => {
                    warn!(%pair, venue, error = %e, "pool pricing rejected");
                    VenueOutcome::Rejected(e)
                }
            },
            Ok(Ok(None)) => VenueOutcome::Absent,
            Ok(Err(e)) => {
                warn!(%pair, venue, error = %e, "pool query failed");
                VenueOutcome::Failed(e)
            }
            Err(_) => {
                warn!(%pair, venue, timeout_ms = self.timeout_ms(), "pool query timed out");
                VenueOutcome::Failed(VenueError::Timeout { venue, after_ms: self.timeout_ms() })
            }
        }
    }

    /// Gross output walks the whole input; the taker fee comes off the input
    /// and the remainder walks the book again for the net output
    pub fn price_order_book(&self, depth: &DepthSnapshot, amount_in: u128) -> Result<Option<VenueQuote>> {
        let Some(gross) = depth.simulate_taker_fill(amount_in)? else {
            return Ok(None);
        };
        let split = self.fees.split(amount_in, depth.taker_fee)?;
        let Some(fill) = depth.simulate_taker_fill(split.net_amount_in)? else {
            return Ok(None);
        };
        if fill.amount_out == 0 {
            return Ok(None);
        }
        Ok(Some(VenueQuote {
            route: Route::OrderBook,
            amount_in,
            fee_amount: split.fee_amount,
            fee_rate: depth.taker_fee,
            amount_out: gross.amount_out,
            net_amount_out: fill.amount_out,
            expected_out: fill.ideal_amount_out,
            price_impact: fill.price_impact,
            levels_consumed: fill.levels_consumed,
            maker_fills: fill.maker_fills,
        }))
    }

    /// Pool fee is embedded in the curve; the reported fee is its input share
    pub fn price_amm(&self, pool: &PoolState, token_in: &str, amount_in: u128) -> Result<Option<VenueQuote>> {
        let simulation = pool.simulate_swap(token_in, amount_in)?;
        if simulation.amount_out == 0 {
            return Ok(None);
        }
        Ok(Some(VenueQuote {
            route: Route::Amm,
            amount_in,
            fee_amount: self.fees.calculate_fee(amount_in, pool.fee())?,
            fee_rate: pool.fee(),
            amount_out: simulation.amount_out,
            net_amount_out: simulation.amount_out,
            expected_out: simulation.spot_amount_out,
            price_impact: simulation.price_impact,
            levels_consumed: 1,
            maker_fills: Vec::new(),
        }))
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.venue_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Combine both outcomes
///
/// With no priced venue, any failure makes the request retryable
/// (`VenueUnavailable`). Otherwise a rejection is returned as is, and two
/// absent venues are `NoRoute`.
pub fn decide(pair: &AssetPair, book: VenueOutcome, amm: VenueOutcome) -> Result<Selection> {
    match (book.quote().cloned(), amm.quote().cloned()) {
        (Some(book), Some(amm)) => {
            let (best, alternative) = if book.net_amount_out >= amm.net_amount_out {
                (book, amm)
            } else {
                (amm, book)
            };
            Ok(Selection { best, alternative: Some(alternative) })
        }
        (Some(best), None) | (None, Some(best)) => Ok(Selection { best, alternative: None }),
        (None, None) => {
            let failures: Vec<String> = [&book, &amm]
                .into_iter()
                .filter_map(|outcome| match outcome {
                    VenueOutcome::Failed(e) => Some(e.to_string()),
                    _ => None,
                })
                .collect();
            if !failures.is_empty() {
                return Err(RouterError::VenueUnavailable {
                    pair: pair.clone(),
                    reason: failures.join("; "),
                });
            }
            match [book, amm].into_iter().find_map(|outcome| match outcome {
                VenueOutcome::Rejected(e) => Some(e),
                _ => None,
            }) {
                Some(rejection) => Err(rejection),
                None => Err(RouterError::NoRoute { pair: pair.clone() }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venues::{LocalAmm, LocalOrderBook};
    use amm::PoolRegistry;
    use orderbook::{OrderBookRegistry, PriceLevel, RestingOrder, TakerFeeSchedule};
    use types::{FixedPointError, ManualClock, OrderId, Price, Side};

    const E18: u128 = 1_000_000_000_000_000_000;

    fn pair() -> AssetPair {
        AssetPair::canonical("base", "quote").unwrap()
    }

    fn quote(route: Route, amount_out: u128) -> VenueQuote {
        VenueQuote {
            route,
            amount_in: 1_000,
            fee_amount: 0,
            fee_rate: BasisPoints::ZERO,
            amount_out,
            net_amount_out: amount_out,
            expected_out: amount_out,
            price_impact: BasisPoints::ZERO,
            levels_consumed: 1,
            maker_fills: Vec::new(),
        }
    }

    fn selector() -> RouteSelector {
        let books = OrderBookRegistry::new(
            TakerFeeSchedule::new(25).unwrap(),
            Arc::new(ManualClock::new(0)),
        );
        RouteSelector::new(
            Arc::new(LocalOrderBook::new(Arc::new(books))),
            Arc::new(LocalAmm::new(Arc::new(PoolRegistry::new()))),
            Duration::from_millis(10),
        )
    }

    /// One bid level at 1.5 quote per base
    fn bid_depth(base_amount: u128, quote_amount: u128) -> DepthSnapshot {
        DepthSnapshot {
            pair: pair(),
            side: Side::Bid,
            levels: vec![PriceLevel {
                price: Price::from_raw(1_500_000),
                base_amount,
                quote_amount,
                order_count: 1,
            }],
            queues: vec![vec![RestingOrder { order_id: OrderId::new(4), remaining_in: quote_amount }]],
            taker_fee: BasisPoints::new(25),
            taken_at_ns: 0,
        }
    }

    fn failed() -> VenueOutcome {
        VenueOutcome::Failed(VenueError::Timeout { venue: "amm", after_ms: 10 })
    }

    #[test]
    fn test_larger_net_output_wins() {
        let selection = decide(
            &pair(),
            VenueOutcome::Priced(quote(Route::OrderBook, 90)),
            VenueOutcome::Priced(quote(Route::Amm, 100)),
        )
        .unwrap();
        assert_eq!(selection.best.route, Route::Amm);
        assert_eq!(selection.alternative.map(|q| q.route), Some(Route::OrderBook));
    }

    #[test]
    fn test_tie_favours_order_book() {
        let selection = decide(
            &pair(),
            VenueOutcome::Priced(quote(Route::OrderBook, 100)),
            VenueOutcome::Priced(quote(Route::Amm, 100)),
        )
        .unwrap();
        assert_eq!(selection.best.route, Route::OrderBook);
    }

    #[test]
    fn test_survivor_used_when_one_venue_fails() {
        let selection =
            decide(&pair(), failed(), VenueOutcome::Priced(quote(Route::Amm, 100))).unwrap();
        assert_eq!(selection.best.route, Route::Amm);
        assert_eq!(selection.alternative, None);
    }

    #[test]
    fn test_no_route_and_unavailable() {
        assert_eq!(
            decide(&pair(), VenueOutcome::Absent, VenueOutcome::Absent),
            Err(RouterError::NoRoute { pair: pair() })
        );
        let err = decide(&pair(), failed(), failed()).unwrap_err();
        assert!(err.is_retryable());
        let err = decide(&pair(), VenueOutcome::Absent, failed()).unwrap_err();
        assert!(matches!(err, RouterError::VenueUnavailable { .. }));
    }

    #[test]
    fn test_rejection_is_not_retryable() {
        let overflow = RouterError::FixedPoint(FixedPointError::Overflow { context: "taker fill output" });
        let err = decide(&pair(), VenueOutcome::Rejected(overflow.clone()), VenueOutcome::Absent)
            .unwrap_err();
        assert_eq!(err, overflow);
        assert!(!err.is_retryable());

        // A transient failure elsewhere still makes a retry worthwhile
        let err = decide(&pair(), VenueOutcome::Rejected(overflow), failed()).unwrap_err();
        assert!(err.is_retryable());

        let selection = decide(
            &pair(),
            VenueOutcome::Rejected(RouterError::NoRoute { pair: pair() }),
            VenueOutcome::Priced(quote(Route::Amm, 100)),
        )
        .unwrap();
        assert_eq!(selection.best.route, Route::Amm);
    }

    #[test]
    fn test_order_book_reports_gross_and_net_output() {
        let depth = bid_depth(10 * E18, 15_000_000);
        let selector = selector();
        let quote = selector.price_order_book(&depth, E18).unwrap().unwrap();
        assert_eq!(quote.amount_out, 1_500_000);
        assert_eq!(quote.net_amount_out, 1_496_250);
        assert_eq!(quote.fee_amount, 2_500_000_000_000_000);
        assert_eq!(
            quote.maker_fills,
            vec![MakerFill { order_id: OrderId::new(4), filled_in: 1_496_250 }]
        );
    }

    #[test]
    fn test_order_book_short_of_gross_input_is_absent() {
        let depth = bid_depth(E18, 1_500_000);
        let selector = selector();
        // Net input fits the level, the full input does not
        assert_eq!(selector.price_order_book(&depth, E18 + 1).unwrap(), None);
    }
}
