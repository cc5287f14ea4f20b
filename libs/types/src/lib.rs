//! # Smart Order Router Types Library
//!
//! Shared type system for the order book, AMM and routing crates.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: All amounts and prices stored as scaled integers
//! - **Wide Intermediates**: Products of two amounts are computed in 256 bits
//! - **Type Safety**: Typed ids and price/bps newtypes prevent mixing domains
//! - **One Market Key**: [`AssetPair`] is canonical, so both swap directions
//!   between two assets address the same book and pool
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{AssetPair, BasisPoints, Price, Side};
//!
//! let pair = AssetPair::canonical("0x9876", "0x1234").unwrap();
//! assert_eq!(pair.base(), "0x1234");
//!
//! // 1_500_000 raw quote units per 10^18 raw base units
//! let price = Price::from_raw(1_500_000);
//! assert_eq!(price.quote_for_base(1_000_000_000_000_000_000).unwrap(), 1_500_000);
//!
//! // 25 bps taker fee on one whole token
//! let fee = BasisPoints::new(25).apply(1_000_000_000_000_000_000).unwrap();
//! assert_eq!(fee, 2_500_000_000_000_000);
//!
//! // Selling the base asset rests on the ask side
//! assert_eq!(Side::for_maker_input(&pair, "0x1234"), Some(Side::Ask));
//! ```

pub mod common;
pub mod orders;
pub mod quote;
pub mod time;

pub use common::errors::{FixedPointError, ValidationError};
pub use common::fixed_point::{
    amount_from_decimal_str, format_amount, mul_div, mul_div_ceil, narrow, BasisPoints, Price,
    BPS_DENOMINATOR,
};
pub use common::identifiers::{AssetPair, OrderId, PairLeg, QuoteId};
pub use orders::{LimitOrder, OrderRequest, OrderStateError, OrderStatus, Side};
pub use quote::{AlternativeQuote, MakerFill, Route, SwapQuote, SwapRequest};
pub use time::{Clock, ManualClock, SystemClock};

pub use primitive_types::U256;
