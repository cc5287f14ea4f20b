//! # Order Book Library
//!
//! Per-pair central limit order books. Each canonical [`types::AssetPair`]
//! owns one [`OrderBook`] holding both sides in strict price-time priority;
//! the [`OrderBookRegistry`] maps pairs to books behind per-pair locks and
//! owns order id assignment, the taker fee schedule and owner lookups.
//!
//! Reads never return cancelled, filled or past-deadline orders. Taker fills
//! are priced from a [`DepthSnapshot`] copied out under a short read lock.

pub mod book;
pub mod depth;
pub mod error;
pub mod registry;

pub use book::{CancelOutcome, OrderBook};
pub use depth::{DepthSnapshot, PriceLevel, RestingOrder, TakerFill};
pub use error::{BookError, Result};
pub use registry::{BestPrices, BookSnapshot, OrderBookRegistry, TakerFeeSchedule};
