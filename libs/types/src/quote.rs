//! Swap requests and the quotes produced for them

use crate::common::fixed_point::BasisPoints;
use crate::common::identifiers::{AssetPair, OrderId, QuoteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution venue chosen for a swap
///
/// Closed set: adding a venue means adding a variant and handling it
/// everywhere the compiler points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    OrderBook,
    Amm,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::OrderBook => f.write_str("orderbook"),
            Route::Amm => f.write_str("amm"),
        }
    }
}

/// Request to price an exchange of `amount_in` of `token_in` for `token_out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    /// Soft cap: exceeding it flags the quote instead of failing
    pub max_slippage_bps: Option<u32>,
    /// Hard floor on net output
    pub min_amount_out: Option<u128>,
}

impl SwapRequest {
    pub fn new(token_in: impl Into<String>, token_out: impl Into<String>, amount_in: u128) -> Self {
        Self {
            token_in: token_in.into(),
            token_out: token_out.into(),
            amount_in,
            max_slippage_bps: None,
            min_amount_out: None,
        }
    }

    pub fn with_max_slippage_bps(mut self, bps: u32) -> Self {
        self.max_slippage_bps = Some(bps);
        self
    }

    pub fn with_min_amount_out(mut self, amount: u128) -> Self {
        self.min_amount_out = Some(amount);
        self
    }
}

/// Share of one resting order a taker fill would consume
///
/// `filled_in` is in the maker's input asset, the unit
/// `ApplyFill` expects when settlement reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerFill {
    pub order_id: OrderId,
    pub filled_in: u128,
}

/// Output offered by the venue that lost the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeQuote {
    pub route: Route,
    pub amount_out: u128,
    pub net_amount_out: u128,
}

/// Priced swap on the winning venue
///
/// All amounts are raw units: `amount_in` and `fee_amount` in `token_in`,
/// `amount_out` and `net_amount_out` in `token_out`.
///
/// `amount_out` is the venue's output for the whole of `amount_in`: the book
/// walked with the full input, or the pool curve (whose fee is part of the
/// curve). `net_amount_out` is what the taker receives once the order book
/// taker fee is taken from the input; on the AMM route the two are equal.
/// Route selection, `min_amount_out` and slippage all use the net figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub quote_id: QuoteId,
    pub pair: AssetPair,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub amount_out: u128,
    pub net_amount_out: u128,
    pub fee_amount: u128,
    pub fee_rate: BasisPoints,
    pub route: Route,
    pub slippage_bps: u32,
    pub price_impact_bps: u32,
    pub gas_estimate: u64,
    /// Set when the request carried `max_slippage_bps` and slippage exceeds it
    pub exceeds_slippage_tolerance: bool,
    pub max_slippage_bps: Option<u32>,
    /// The other venue's output, when it was available
    pub alternative: Option<AlternativeQuote>,
    /// Resting orders consumed, in matching priority; empty on the AMM route
    pub maker_fills: Vec<MakerFill>,
    pub quoted_at_ns: u64,
    pub valid_until_ns: u64,
}

impl SwapQuote {
    pub fn is_valid_at(&self, now_ns: u64) -> bool {
        now_ns <= self.valid_until_ns
    }
}
