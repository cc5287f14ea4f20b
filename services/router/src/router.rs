//! Smart order router facade
//!
//! Owns the order book and pool registries, the route selector and the order
//! lifecycle manager, and exposes the service operations on top of them.

use crate::collaborators::{
    AssetBlocklist, ExecutionResult, ExecutionService, NoopPersistence, PersistenceSink, RiskCheck,
    SigningMaterial, UnconfiguredExecution,
};
use crate::cost::{CostEstimator, GasModel};
use crate::error::{Result, RouterError};
use crate::lifecycle::{CancelAck, OrderLifecycleManager};
use crate::selector::RouteSelector;
use crate::stats::{RouterStats, StatsSnapshot};
use crate::venues::{AmmVenue, LocalAmm, LocalOrderBook, OrderBookVenue};
use crate::{log_error, log_execution, log_metrics, log_pool, log_route, log_warning};
use amm::{PoolRegistry, PoolState};
use config::RouterConfig;
use orderbook::{BestPrices, BookSnapshot, OrderBookRegistry, TakerFeeSchedule};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use types::time::duration_to_ns;
use types::{
    AlternativeQuote, AssetPair, BasisPoints, Clock, LimitOrder, OrderId,
    OrderRequest, Price, QuoteId, SwapQuote, SwapRequest, SystemClock, ValidationError,
};

/// Orders touched by one [`SmartOrderRouter::sweep`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Newly recorded as expired
    pub expired: Vec<OrderId>,
    /// Closed orders dropped after the retention window
    pub evicted: Vec<OrderId>,
}

/// Assembles a [`SmartOrderRouter`] with injectable collaborators
pub struct RouterBuilder {
    config: RouterConfig,
    clock: Arc<dyn Clock>,
    persistence: Arc<dyn PersistenceSink>,
    execution: Arc<dyn ExecutionService>,
    risk: Arc<dyn RiskCheck>,
    pools: Option<Arc<PoolRegistry>>,
    order_book_venue: Option<Arc<dyn OrderBookVenue>>,
    amm_venue: Option<Arc<dyn AmmVenue>>,
}

impl RouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            persistence: Arc::new(NoopPersistence),
            execution: Arc::new(UnconfiguredExecution),
            risk: Arc::new(AssetBlocklist::new()),
            pools: None,
            order_book_venue: None,
            amm_venue: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceSink>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_execution(mut self, execution: Arc<dyn ExecutionService>) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_risk(mut self, risk: Arc<dyn RiskCheck>) -> Self {
        self.risk = risk;
        self
    }

    /// Share an existing pool registry instead of starting empty
    pub fn with_pools(mut self, pools: Arc<PoolRegistry>) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Replace the local order book as a routing venue
    pub fn with_order_book_venue(mut self, venue: Arc<dyn OrderBookVenue>) -> Self {
        self.order_book_venue = Some(venue);
        self
    }

    /// Replace the local pool registry as a routing venue
    pub fn with_amm_venue(mut self, venue: Arc<dyn AmmVenue>) -> Self {
        self.amm_venue = Some(venue);
        self
    }

    pub fn build(self) -> Result<SmartOrderRouter> {
        let fees = TakerFeeSchedule::new(self.config.order_book.default_taker_fee_bps)?;
        for fee_override in &self.config.order_book.fee_overrides {
            let pair = AssetPair::canonical(fee_override.token_a.as_str(), fee_override.token_b.as_str())?;
            fees.set_override(pair, fee_override.taker_fee_bps)?;
        }

        let books = Arc::new(OrderBookRegistry::new(fees, Arc::clone(&self.clock)));
        let pools = self.pools.unwrap_or_else(|| Arc::new(PoolRegistry::new()));

        let order_book_venue = self
            .order_book_venue
            .unwrap_or_else(|| Arc::new(LocalOrderBook::new(Arc::clone(&books))) as Arc<dyn OrderBookVenue>);
        let amm_venue = self
            .amm_venue
            .unwrap_or_else(|| Arc::new(LocalAmm::new(Arc::clone(&pools))) as Arc<dyn AmmVenue>);

        let selector = RouteSelector::new(
            order_book_venue,
            amm_venue,
            Duration::from_millis(self.config.routing.venue_timeout_ms),
        );
        let stats = Arc::new(RouterStats::default());
        let lifecycle = OrderLifecycleManager::new(
            Arc::clone(&books),
            Arc::clone(&self.risk),
            Arc::clone(&self.persistence),
            Arc::clone(&stats),
        );

        Ok(SmartOrderRouter {
            books,
            pools,
            selector,
            lifecycle,
            costs: CostEstimator,
            gas: GasModel::from(&self.config.gas),
            quote_validity_ns: duration_to_ns(Duration::from_millis(
                self.config.routing.quote_validity_ms,
            )),
            max_snapshot_depth: self.config.routing.max_snapshot_depth,
            sweep_interval: Duration::from_millis(self.config.order_book.sweep_interval_ms),
            closed_order_retention_ns: duration_to_ns(Duration::from_millis(
                self.config.order_book.closed_order_retention_ms,
            )),
            clock: self.clock,
            risk: self.risk,
            persistence: self.persistence,
            execution: self.execution,
            stats,
            next_quote_id: AtomicU64::new(1),
        })
    }
}

pub struct SmartOrderRouter {
    books: Arc<OrderBookRegistry>,
    pools: Arc<PoolRegistry>,
    selector: RouteSelector,
    lifecycle: OrderLifecycleManager,
    costs: CostEstimator,
    gas: GasModel,
    quote_validity_ns: u64,
    max_snapshot_depth: usize,
    sweep_interval: Duration,
    closed_order_retention_ns: u64,
    clock: Arc<dyn Clock>,
    risk: Arc<dyn RiskCheck>,
    persistence: Arc<dyn PersistenceSink>,
    execution: Arc<dyn ExecutionService>,
    stats: Arc<RouterStats>,
    next_quote_id: AtomicU64,
}

impl SmartOrderRouter {
    pub fn builder(config: RouterConfig) -> RouterBuilder {
        RouterBuilder::new(config)
    }

    /// Router with default collaborators and the system clock
    pub fn new(config: RouterConfig) -> Result<Self> {
        RouterBuilder::new(config).build()
    }

    pub fn order_books(&self) -> &Arc<OrderBookRegistry> {
        &self.books
    }

    pub fn pools(&self) -> &Arc<PoolRegistry> {
        &self.pools
    }

    /// Price a swap on the better venue
    ///
    /// Slippage above `max_slippage_bps` flags the quote; net output below
    /// `min_amount_out` fails with `InsufficientOutput`.
    pub async fn calculate_swap_cost(&self, request: SwapRequest) -> Result<SwapQuote> {
        let pair = AssetPair::canonical(request.token_in.as_str(), request.token_out.as_str())?;
        if request.amount_in == 0 {
            return Err(ValidationError::NonPositiveAmount { field: "amount_in" }.into());
        }
        if let Some(max) = request.max_slippage_bps {
            if max > BasisPoints::MAX {
                return Err(ValidationError::BasisPointsOutOfRange {
                    value: max,
                    max: BasisPoints::MAX,
                }
                .into());
            }
        }
        self.ensure_not_blocked(&request.token_in)?;
        self.ensure_not_blocked(&request.token_out)?;

        let selection = match self.selector.select(&pair, &request.token_in, request.amount_in).await {
            Ok(selection) => selection,
            Err(e) => {
                self.stats.record_quote_failure();
                return Err(e);
            }
        };
        let best = selection.best;

        if let Some(min_amount_out) = request.min_amount_out {
            if best.net_amount_out < min_amount_out {
                self.stats.record_quote_failure();
                return Err(RouterError::InsufficientOutput {
                    amount_out: best.net_amount_out,
                    min_amount_out,
                });
            }
        }

        let cost = self.costs.estimate(
            best.expected_out,
            best.net_amount_out,
            best.price_impact,
            request.max_slippage_bps,
        )?;
        let quoted_at_ns = self.clock.now_ns();
        let quote = SwapQuote {
            quote_id: QuoteId::new(self.next_quote_id.fetch_add(1, Ordering::Relaxed)),
            pair,
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            amount_out: best.amount_out,
            net_amount_out: best.net_amount_out,
            fee_amount: best.fee_amount,
            fee_rate: best.fee_rate,
            route: best.route,
            slippage_bps: cost.slippage_bps,
            price_impact_bps: cost.price_impact_bps,
            gas_estimate: self.gas.estimate(best.route, best.levels_consumed),
            exceeds_slippage_tolerance: cost.exceeds_tolerance,
            max_slippage_bps: request.max_slippage_bps,
            alternative: selection.alternative.map(|alt| AlternativeQuote {
                route: alt.route,
                amount_out: alt.amount_out,
                net_amount_out: alt.net_amount_out,
            }),
            maker_fills: best.maker_fills,
            quoted_at_ns,
            valid_until_ns: quoted_at_ns.saturating_add(self.quote_validity_ns),
        };

        self.stats.record_quote(quote.route, quote.amount_in);
        log_route!(
            "{} routed to {}: {} {} -> {} {} (fee {}, slippage {}bps, impact {}bps)",
            quote.quote_id,
            quote.route,
            quote.amount_in,
            quote.token_in,
            quote.net_amount_out,
            quote.token_out,
            quote.fee_amount,
            quote.slippage_bps,
            quote.price_impact_bps
        );
        if quote.exceeds_slippage_tolerance {
            log_warning!(
                "{} exceeds slippage tolerance: {}bps > {:?}bps",
                quote.quote_id,
                quote.slippage_bps,
                quote.max_slippage_bps
            );
        }
        Ok(quote)
    }

    pub async fn create_limit_order(&self, request: OrderRequest) -> Result<LimitOrder> {
        self.lifecycle.create(request).await
    }

    pub async fn cancel_order(&self, order_id: OrderId, requester: &str) -> Result<CancelAck> {
        self.lifecycle.cancel(order_id, requester).await
    }

    pub async fn apply_fill(&self, order_id: OrderId, filled_in: u128) -> Result<LimitOrder> {
        self.lifecycle.apply_fill(order_id, filled_in).await
    }

    pub async fn observe_expired(&self, token_a: &str, token_b: &str) -> Result<Vec<OrderId>> {
        let pair = AssetPair::canonical(token_a, token_b)?;
        self.lifecycle.observe_expired(&pair).await
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<LimitOrder> {
        self.lifecycle.get_order(order_id)
    }

    pub fn get_user_orders(&self, owner: &str, limit: usize) -> Vec<LimitOrder> {
        self.lifecycle.user_orders(owner, limit)
    }

    pub fn get_best_price(&self, token_a: &str, token_b: &str) -> Result<BestPrices> {
        let pair = AssetPair::canonical(token_a, token_b)?;
        Ok(self.books.best_prices(&pair)?)
    }

    /// Top `depth` levels per side, capped by configuration
    pub fn get_order_book_snapshot(
        &self,
        token_a: &str,
        token_b: &str,
        depth: usize,
    ) -> Result<BookSnapshot> {
        let pair = AssetPair::canonical(token_a, token_b)?;
        if depth > self.max_snapshot_depth {
            return Err(ValidationError::Custom {
                message: format!("depth {} exceeds maximum {}", depth, self.max_snapshot_depth),
            }
            .into());
        }
        Ok(self.books.snapshot(&pair, depth)?)
    }

    /// Marginal quote-per-base price and fee of the pair's pool
    pub fn get_pool_price(&self, token_a: &str, token_b: &str) -> Result<Option<(Price, BasisPoints)>> {
        let pair = AssetPair::canonical(token_a, token_b)?;
        Ok(self.pools.get_price(&pair)?)
    }

    /// Register or replace a pool snapshot
    pub fn upsert_pool(&self, pool: PoolState) -> Result<()> {
        let pair = pool.pair.clone();
        self.pools.upsert(pool)?;
        log_pool!("Pool {} updated", pair);
        Ok(())
    }

    /// Hand a still-valid quote to execution and record the result
    pub async fn execute_swap(
        &self,
        quote: &SwapQuote,
        signing: &SigningMaterial,
    ) -> Result<ExecutionResult> {
        let now_ns = self.clock.now_ns();
        if !quote.is_valid_at(now_ns) {
            return Err(RouterError::QuoteExpired {
                quote_id: quote.quote_id,
                valid_until_ns: quote.valid_until_ns,
            });
        }
        self.ensure_not_blocked(&quote.token_in)?;
        self.ensure_not_blocked(&quote.token_out)?;

        let result = match self.execution.execute(quote, signing).await {
            Ok(result) => result,
            Err(e) => {
                log_error!("Execution of {} on {} failed: {}", quote.quote_id, quote.route, e);
                return Err(RouterError::Execution(e));
            }
        };
        self.stats.record_swap_executed();
        log_execution!(
            "{} executed on {}: {} out, ref {}",
            result.quote_id,
            result.route,
            result.amount_out,
            result.reference
        );

        if let Err(e) = self.persistence.record_execution(&result).await {
            self.stats.record_persistence_failure();
            log_warning!("Failed to persist execution of {}: {}", result.quote_id, e);
        }
        Ok(result)
    }

    /// Record expiry for every past-deadline order, then evict closed orders
    /// older than the retention window
    pub async fn sweep(&self) -> Result<SweepReport> {
        let mut expired = Vec::new();
        for pair in self.books.pairs() {
            expired.extend(self.lifecycle.observe_expired(&pair).await?);
        }
        let closed_before_ns = self.clock.now_ns().saturating_sub(self.closed_order_retention_ns);
        let evicted = self.books.evict_closed(closed_before_ns);
        self.stats.record_orders_evicted(evicted.len());

        if !expired.is_empty() || !evicted.is_empty() {
            log_metrics!(
                "Sweep: {} expired, {} evicted, {} open, {} tracked",
                expired.len(),
                evicted.len(),
                self.books.open_order_count(),
                self.books.tracked_order_count()
            );
        }
        Ok(SweepReport { expired, evicted })
    }

    /// Period the service runs [`SmartOrderRouter::sweep`] at
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Log current counters and registry sizes
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            quotes = stats.quotes_served(),
            quotes_order_book = stats.quotes_order_book,
            quotes_amm = stats.quotes_amm,
            orders_created = stats.orders_created,
            orders_expired = stats.orders_expired,
            orders_evicted = stats.orders_evicted,
            open_orders = self.books.open_order_count(),
            books = self.books.book_count(),
            pools = self.pools.len(),
            "router stats"
        );
    }

    fn ensure_not_blocked(&self, asset: &str) -> Result<()> {
        if self.risk.is_blocked(asset) {
            debug!(asset, "request rejected by risk check");
            return Err(RouterError::AssetBlocked {
                asset: asset.to_string(),
            });
        }
        Ok(())
    }
}
