//! # Smart Order Router
//!
//! Routes a swap to whichever venue returns more output net of fees: the
//! resident limit order book or the constant-product pool for the pair. It
//! also manages the lifecycle of resting limit orders.
//!
//! ## Architecture
//!
//! ```text
//! SwapRequest ─► SmartOrderRouter ─► RouteSelector ─┬─► OrderBookVenue (depth snapshot)
//!                      │                            └─► AmmVenue (pool snapshot)
//!                      │                 FeeCalculator + CostEstimator
//!                      ▼
//! OrderRequest ─► OrderLifecycleManager ─► OrderBookRegistry
//! ```
//!
//! Venue queries run concurrently, each under the configured timeout. A venue
//! that fails or times out is dropped and the other one is used.
//!
//! ## Example
//!
//! ```
//! use amm::PoolState;
//! use config::RouterConfig;
//! use smart_order_router::SmartOrderRouter;
//! use types::{AssetPair, Route, SwapRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let router = SmartOrderRouter::new(RouterConfig::default())?;
//! let pair = AssetPair::canonical("0xweth", "0xusdc")?;
//! router.upsert_pool(PoolState::new(pair, 1_000_000_000, 1_500_000_000, 30, 0)?)?;
//!
//! let quote = router
//!     .calculate_swap_cost(SwapRequest::new("0xusdc", "0xweth", 1_000_000))
//!     .await?;
//! assert_eq!(quote.route, Route::Amm);
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod cost;
pub mod error;
pub mod fee;
pub mod lifecycle;
pub mod logging;
pub mod pool_loader;
pub mod router;
pub mod selector;
pub mod stats;
pub mod venues;

pub use collaborators::{
    AssetBlocklist, CollaboratorError, ExecutionResult, ExecutionService, InMemoryHistory,
    NoopPersistence, PersistenceSink, RiskCheck, SigningMaterial, UnconfiguredExecution,
};
pub use cost::{CostEstimate, CostEstimator, GasModel, ToleranceCheck};
pub use error::{Result, RouterError};
pub use fee::{FeeBreakdown, FeeCalculator};
pub use lifecycle::{CancelAck, OrderLifecycleManager};
pub use pool_loader::load_pool_seed;
pub use router::{RouterBuilder, SmartOrderRouter, SweepReport};
pub use selector::{RouteSelector, Selection, VenueOutcome, VenueQuote};
pub use stats::{RouterStats, StatsSnapshot};
pub use venues::{AmmVenue, LocalAmm, LocalOrderBook, OrderBookVenue, VenueError};
