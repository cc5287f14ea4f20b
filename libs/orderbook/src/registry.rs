//! Order book registry
//!
//! One [`OrderBook`] per canonical pair, each behind its own
//! `parking_lot::RwLock`. Writes to a pair serialize against that pair's
//! readers only; different pairs never contend. Order ids come from a single
//! atomic counter and are indexed back to their pair and owner. An id is
//! drawn while its book is write-locked, so within a pair id order is queue
//! order.

use crate::book::{CancelOutcome, OrderBook};
use crate::depth::{DepthSnapshot, PriceLevel};
use crate::error::{BookError, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use types::{
    AssetPair, BasisPoints, Clock, LimitOrder, OrderId, OrderRequest, OrderStatus, Side,
    ValidationError,
};

/// Best resting level per side plus the fee a taker pays on this pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPrices {
    pub pair: AssetPair,
    pub best_bid: Option<PriceLevel>,
    pub best_ask: Option<PriceLevel>,
    pub taker_fee: BasisPoints,
}

/// Aggregated levels per side, best first, amounts in base units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub pair: AssetPair,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub taken_at_ns: u64,
}

/// Default taker fee with per-pair overrides
#[derive(Debug)]
pub struct TakerFeeSchedule {
    default_fee: BasisPoints,
    overrides: DashMap<AssetPair, BasisPoints>,
}

impl TakerFeeSchedule {
    pub fn new(default_fee_bps: u32) -> Result<Self> {
        Ok(Self {
            default_fee: BasisPoints::fee_rate(default_fee_bps)?,
            overrides: DashMap::new(),
        })
    }

    pub fn set_override(&self, pair: AssetPair, fee_bps: u32) -> Result<()> {
        let fee = BasisPoints::fee_rate(fee_bps)?;
        self.overrides.insert(pair, fee);
        Ok(())
    }

    pub fn fee_for(&self, pair: &AssetPair) -> BasisPoints {
        self.overrides
            .get(pair)
            .map(|fee| *fee)
            .unwrap_or(self.default_fee)
    }
}

pub struct OrderBookRegistry {
    books: DashMap<AssetPair, Arc<RwLock<OrderBook>>>,
    order_index: DashMap<OrderId, AssetPair>,
    owner_index: DashMap<String, Vec<OrderId>>,
    next_order_id: AtomicU64,
    fees: TakerFeeSchedule,
    clock: Arc<dyn Clock>,
}

impl OrderBookRegistry {
    pub fn new(fees: TakerFeeSchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            books: DashMap::new(),
            order_index: DashMap::new(),
            owner_index: DashMap::new(),
            next_order_id: AtomicU64::new(1),
            fees,
            clock,
        }
    }

    pub fn now_ns(&self) -> u64 {
        self.clock.now_ns()
    }

    pub fn fees(&self) -> &TakerFeeSchedule {
        &self.fees
    }

    /// Check a request and resolve its pair and side without touching any book
    pub fn validate(&self, request: &OrderRequest, now_ns: u64) -> Result<(AssetPair, Side)> {
        if request.owner.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier { field: "owner" }.into());
        }
        let pair = AssetPair::canonical(request.token_in.as_str(), request.token_out.as_str())?;
        if request.amount_in == 0 {
            return Err(ValidationError::NonPositiveAmount { field: "amount_in" }.into());
        }
        if request.limit_price.is_zero() {
            return Err(ValidationError::NonPositivePrice.into());
        }
        if let Some(deadline_ns) = request.deadline_ns {
            if deadline_ns <= now_ns {
                return Err(ValidationError::DeadlineInPast { deadline_ns, now_ns }.into());
            }
        }
        let side = Side::for_maker_input(&pair, &request.token_in).ok_or_else(|| {
            ValidationError::Custom {
                message: format!("{} is not part of {}", request.token_in, pair),
            }
        })?;
        // Sizes are reported on both legs; an order worth nothing on the other
        // leg would still rank as the best price
        let counter_amount = match side {
            Side::Bid => request.limit_price.base_for_quote(request.amount_in)?,
            Side::Ask => request.limit_price.quote_for_base(request.amount_in)?,
        };
        if counter_amount == 0 {
            return Err(ValidationError::DustOrder {
                amount_in: request.amount_in,
                limit_price: request.limit_price.raw(),
            }
            .into());
        }
        Ok((pair, side))
    }

    /// Validate and rest a new order; visible to the next best-price read
    pub fn add_order(&self, request: OrderRequest) -> Result<LimitOrder> {
        let (pair, side) = self.validate(&request, self.now_ns())?;
        let lock = self.book_or_create(&pair);
        let mut book = lock.write();

        let now_ns = self.now_ns();
        if let Some(deadline_ns) = request.deadline_ns {
            if deadline_ns <= now_ns {
                return Err(ValidationError::DeadlineInPast { deadline_ns, now_ns }.into());
            }
        }
        let id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        let order = LimitOrder {
            id,
            owner: request.owner,
            pair: pair.clone(),
            side,
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            remaining_in: request.amount_in,
            limit_price: request.limit_price,
            status: OrderStatus::Active,
            created_at_ns: now_ns,
            updated_at_ns: now_ns,
            deadline_ns: request.deadline_ns,
            sequence: 0,
        };
        let order = book.insert(order);
        drop(book);

        self.order_index.insert(id, pair);
        self.owner_index
            .entry(order.owner.clone())
            .or_default()
            .push(id);
        Ok(order)
    }

    pub fn cancel_order(&self, order_id: OrderId, requester: &str) -> Result<CancelOutcome> {
        let book = self.book_of(order_id)?;
        let now_ns = self.now_ns();
        let outcome = book.write().cancel(order_id, requester, now_ns)?;
        Ok(outcome)
    }

    /// Record a fill reported by settlement
    pub fn apply_fill(&self, order_id: OrderId, filled_in: u128) -> Result<LimitOrder> {
        let book = self.book_of(order_id)?;
        let now_ns = self.now_ns();
        let order = book.write().apply_fill(order_id, filled_in, now_ns)?;
        Ok(order)
    }

    /// Materialize `Expired` for past-deadline orders on `pair`
    pub fn observe_expired(&self, pair: &AssetPair) -> Result<Vec<OrderId>> {
        let Some(book) = self.book(pair) else {
            return Ok(Vec::new());
        };
        let now_ns = self.now_ns();
        let expired = book.write().observe_expired(now_ns)?;
        if !expired.is_empty() {
            info!(%pair, count = expired.len(), "expired orders observed");
        }
        Ok(expired)
    }

    /// Drop closed orders last changed before `closed_before_ns` from every
    /// book and from the id and owner indices
    ///
    /// An evicted order is gone: lookups return nothing and cancels report
    /// not found.
    pub fn evict_closed(&self, closed_before_ns: u64) -> Vec<OrderId> {
        let mut evicted = Vec::new();
        for pair in self.pairs() {
            let Some(book) = self.book(&pair) else {
                continue;
            };
            let closed = book.write().evict_closed(closed_before_ns);
            for order in closed {
                self.order_index.remove(&order.id);
                if let Some(mut ids) = self.owner_index.get_mut(&order.owner) {
                    ids.retain(|id| *id != order.id);
                }
                self.owner_index.remove_if(&order.owner, |_, ids| ids.is_empty());
                evicted.push(order.id);
            }
        }
        evicted.sort();
        if !evicted.is_empty() {
            info!(count = evicted.len(), closed_before_ns, "closed orders evicted");
        }
        evicted
    }

    /// Orders still matchable across all pairs
    pub fn open_order_count(&self) -> usize {
        let now_ns = self.now_ns();
        self.books
            .iter()
            .map(|entry| entry.value().read().open_order_count(now_ns))
            .sum()
    }

    /// Orders held in memory across all pairs, closed ones included
    pub fn tracked_order_count(&self) -> usize {
        self.order_index.len()
    }

    pub fn best_prices(&self, pair: &AssetPair) -> Result<BestPrices> {
        let taker_fee = self.fees.fee_for(pair);
        let now_ns = self.now_ns();
        let (best_bid, best_ask) = match self.book(pair) {
            Some(book) => {
                let book = book.read();
                (book.best_bid(now_ns)?, book.best_ask(now_ns)?)
            }
            None => (None, None),
        };
        Ok(BestPrices {
            pair: pair.clone(),
            best_bid,
            best_ask,
            taker_fee,
        })
    }

    /// Top `depth` levels per side
    pub fn snapshot(&self, pair: &AssetPair, depth: usize) -> Result<BookSnapshot> {
        if depth == 0 {
            return Err(ValidationError::NonPositiveAmount { field: "depth" }.into());
        }
        let now_ns = self.now_ns();
        let (bids, asks) = match self.book(pair) {
            Some(book) => {
                let book = book.read();
                (
                    book.levels(Side::Bid, depth, now_ns)?,
                    book.levels(Side::Ask, depth, now_ns)?,
                )
            }
            None => (Vec::new(), Vec::new()),
        };
        Ok(BookSnapshot {
            pair: pair.clone(),
            bids,
            asks,
            taken_at_ns: now_ns,
        })
    }

    /// Full depth of the side a taker giving up `token_in` consumes;
    /// `None` when the pair has no book
    pub fn taker_depth(&self, pair: &AssetPair, token_in: &str) -> Result<Option<DepthSnapshot>> {
        let Some(side) = Side::consumed_by_taker(pair, token_in) else {
            return Ok(None);
        };
        let Some(book) = self.book(pair) else {
            return Ok(None);
        };
        let now_ns = self.now_ns();
        let snapshot = book.read().depth_snapshot(side, self.fees.fee_for(pair), now_ns)?;
        debug!(%pair, ?side, levels = snapshot.levels.len(), "depth snapshot taken");
        Ok(Some(snapshot))
    }

    /// Order as currently observed (a passed deadline reads as `Expired`)
    pub fn get_order(&self, order_id: OrderId) -> Option<LimitOrder> {
        let pair = self.order_index.get(&order_id).map(|entry| entry.value().clone())?;
        let book = self.book(&pair)?;
        let now_ns = self.now_ns();
        let book = book.read();
        book.get(order_id).map(|order| observed(order, now_ns))
    }

    /// Up to `limit` of `owner`'s orders, newest first
    pub fn user_orders(&self, owner: &str, limit: usize) -> Vec<LimitOrder> {
        let ids = match self.owner_index.get(owner) {
            Some(ids) => ids.value().clone(),
            None => return Vec::new(),
        };
        let mut orders: Vec<LimitOrder> = ids
            .into_iter()
            .filter_map(|order_id| self.get_order(order_id))
            .collect();
        orders.sort_by(|a, b| (b.created_at_ns, b.id).cmp(&(a.created_at_ns, a.id)));
        orders.truncate(limit);
        orders
    }

    pub fn pairs(&self) -> Vec<AssetPair> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    fn book(&self, pair: &AssetPair) -> Option<Arc<RwLock<OrderBook>>> {
        self.books.get(pair).map(|entry| Arc::clone(entry.value()))
    }

    fn book_or_create(&self, pair: &AssetPair) -> Arc<RwLock<OrderBook>> {
        let entry = self.books.entry(pair.clone()).or_insert_with(|| {
            info!(%pair, "order book created");
            Arc::new(RwLock::new(OrderBook::new(pair.clone())))
        });
        Arc::clone(entry.value())
    }

    fn book_of(&self, order_id: OrderId) -> Result<Arc<RwLock<OrderBook>>> {
        let pair = self
            .order_index
            .get(&order_id)
            .map(|entry| entry.value().clone())
            .ok_or(BookError::NotFound { order_id })?;
        self.book(&pair).ok_or(BookError::NotFound { order_id })
    }
}

fn observed(order: &LimitOrder, now_ns: u64) -> LimitOrder {
    let mut order = order.clone();
    order.status = order.status_at(now_ns);
    order
}
