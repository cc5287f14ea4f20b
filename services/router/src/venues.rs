//! Venue adapters queried by the route selector
//!
//! Each venue answers with a consistent read-only snapshot: the depth of the
//! side a taker would consume, or the pool's reserves. `Ok(None)` means the
//! venue has no liquidity for the pair, which is not a failure.

use amm::{AmmError, PoolRegistry, PoolState};
use async_trait::async_trait;
use orderbook::{BookError, DepthSnapshot, OrderBookRegistry};
use std::sync::Arc;
use thiserror::Error;
use types::AssetPair;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("{venue} unavailable: {reason}")]
    Unavailable { venue: &'static str, reason: String },

    #[error("{venue} timed out after {after_ms}ms")]
    Timeout { venue: &'static str, after_ms: u64 },

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Amm(#[from] AmmError),
}

#[async_trait]
pub trait OrderBookVenue: Send + Sync {
    fn name(&self) -> &'static str {
        "orderbook"
    }

    /// Resting side consumed by a taker giving up `token_in`, best first
    async fn taker_depth(
        &self,
        pair: &AssetPair,
        token_in: &str,
    ) -> Result<Option<DepthSnapshot>, VenueError>;
}

#[async_trait]
pub trait AmmVenue: Send + Sync {
    fn name(&self) -> &'static str {
        "amm"
    }

    async fn pool(&self, pair: &AssetPair) -> Result<Option<PoolState>, VenueError>;
}

/// Order book venue backed by the local registry
pub struct LocalOrderBook {
    books: Arc<OrderBookRegistry>,
}

impl LocalOrderBook {
    pub fn new(books: Arc<OrderBookRegistry>) -> Self {
        Self { books }
    }
}

#[async_trait]
impl OrderBookVenue for LocalOrderBook {
    async fn taker_depth(
        &self,
        pair: &AssetPair,
        token_in: &str,
    ) -> Result<Option<DepthSnapshot>, VenueError> {
        let depth = self.books.taker_depth(pair, token_in)?;
        Ok(depth.filter(|snapshot| !snapshot.is_empty()))
    }
}

/// AMM venue backed by the local pool registry
pub struct LocalAmm {
    pools: Arc<PoolRegistry>,
}

impl LocalAmm {
    pub fn new(pools: Arc<PoolRegistry>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl AmmVenue for LocalAmm {
    async fn pool(&self, pair: &AssetPair) -> Result<Option<PoolState>, VenueError> {
        Ok(self.pools.get(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderbook::TakerFeeSchedule;
    use types::{ManualClock, OrderRequest, Price};

    #[tokio::test]
    async fn test_empty_side_reads_as_absent() {
        let clock = Arc::new(ManualClock::new(1));
        let books = Arc::new(OrderBookRegistry::new(TakerFeeSchedule::new(25).unwrap(), clock));
        let venue = LocalOrderBook::new(Arc::clone(&books));
        let pair = AssetPair::canonical("base", "quote").unwrap();

        assert!(venue.taker_depth(&pair, "base").await.unwrap().is_none());

        // An ask rests; a taker selling base consumes bids, which are empty
        books
            .add_order(OrderRequest {
                owner: "maker".into(),
                token_in: "base".into(),
                token_out: "quote".into(),
                amount_in: 10,
                limit_price: Price::from_raw(Price::SCALE),
                deadline_ns: None,
            })
            .unwrap();
        assert!(venue.taker_depth(&pair, "base").await.unwrap().is_none());
        let asks = venue.taker_depth(&pair, "quote").await.unwrap().unwrap();
        assert_eq!(asks.levels.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_pool_reads_as_absent() {
        let venue = LocalAmm::new(Arc::new(PoolRegistry::new()));
        let pair = AssetPair::canonical("base", "quote").unwrap();
        assert_eq!(venue.pool(&pair).await.unwrap(), None);
    }
}
