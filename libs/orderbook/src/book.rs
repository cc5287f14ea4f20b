//! Single-pair limit order book with strict price-time priority
//!
//! Bids are keyed by `Reverse(price)` so both sides iterate best-first.
//! Within a level, order ids queue in insertion sequence. Expired orders stay
//! in their level until [`OrderBook::observe_expired`] runs, but every read
//! filters them out by deadline, so their invisibility never depends on that
//! bookkeeping pass. Closed orders stay readable until
//! [`OrderBook::evict_closed`] drops them.

use crate::depth::{DepthSnapshot, PriceLevel, RestingOrder};
use crate::error::{BookError, Result};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;
use types::{
    mul_div_ceil, AssetPair, BasisPoints, FixedPointError, LimitOrder, OrderId, OrderStateError,
    OrderStatus, Price, Side,
};

/// Result of a cancel request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    pub order: LimitOrder,
    /// The order was already cancelled; nothing changed
    pub already_cancelled: bool,
}

#[derive(Debug)]
pub struct OrderBook {
    pair: AssetPair,
    bids: BTreeMap<Reverse<Price>, VecDeque<OrderId>>,
    asks: BTreeMap<Price, VecDeque<OrderId>>,
    orders: HashMap<OrderId, LimitOrder>,
    sequence: u64,
}

impl OrderBook {
    pub fn new(pair: AssetPair) -> Self {
        Self {
            pair,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            sequence: 0,
        }
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    /// Insert a validated order at the back of its price level
    pub fn insert(&mut self, mut order: LimitOrder) -> LimitOrder {
        self.sequence += 1;
        order.sequence = self.sequence;

        match order.side {
            Side::Bid => self
                .bids
                .entry(Reverse(order.limit_price))
                .or_default()
                .push_back(order.id),
            Side::Ask => self
                .asks
                .entry(order.limit_price)
                .or_default()
                .push_back(order.id),
        }
        debug!(order_id = %order.id, side = ?order.side, price = %order.limit_price, sequence = order.sequence, "order rested");
        self.orders.insert(order.id, order.clone());
        order
    }

    pub fn get(&self, order_id: OrderId) -> Option<&LimitOrder> {
        self.orders.get(&order_id)
    }

    /// Cancel an open order on behalf of `requester`
    ///
    /// Ownership is checked first. Cancelling a cancelled order succeeds
    /// without change; filled or expired orders are not found.
    pub fn cancel(&mut self, order_id: OrderId, requester: &str, now_ns: u64) -> Result<CancelOutcome> {
        let order = self
            .orders
            .get(&order_id)
            .ok_or(BookError::NotFound { order_id })?;
        if order.owner != requester {
            return Err(BookError::Unauthorized {
                order_id,
                requester: requester.to_string(),
            });
        }

        match order.status_at(now_ns) {
            OrderStatus::Cancelled => Ok(CancelOutcome {
                order: order.clone(),
                already_cancelled: true,
            }),
            OrderStatus::Expired if order.status.is_open() => {
                let order = self.expire(order_id, now_ns)?;
                Err(BookError::ExpiredOnAccess {
                    order: Box::new(order),
                    rejection: Box::new(BookError::NotFound { order_id }),
                })
            }
            OrderStatus::Expired | OrderStatus::Filled => Err(BookError::NotFound { order_id }),
            OrderStatus::Active | OrderStatus::PartiallyFilled => {
                let order = self.close(order_id, OrderStatus::Cancelled, now_ns)?;
                Ok(CancelOutcome {
                    order,
                    already_cancelled: false,
                })
            }
        }
    }

    /// Record `filled_in` of the order's input as matched
    pub fn apply_fill(&mut self, order_id: OrderId, filled_in: u128, now_ns: u64) -> Result<LimitOrder> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(BookError::NotFound { order_id })?;

        let observed = order.status_at(now_ns);
        if observed.is_terminal() {
            let to = if filled_in >= order.remaining_in {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            let rejection = BookError::State(OrderStateError::InvalidTransition {
                order_id,
                from: observed,
                to,
            });
            if observed == OrderStatus::Expired && order.status.is_open() {
                let order = self.expire(order_id, now_ns)?;
                return Err(BookError::ExpiredOnAccess {
                    order: Box::new(order),
                    rejection: Box::new(rejection),
                });
            }
            return Err(rejection);
        }

        let status = order.apply_fill(filled_in, now_ns)?;
        let (side, price) = (order.side, order.limit_price);
        let updated = order.clone();
        if status == OrderStatus::Filled {
            self.unlink(side, price, order_id);
        }
        Ok(updated)
    }

    /// Move every open order past its deadline to `Expired`
    pub fn observe_expired(&mut self, now_ns: u64) -> Result<Vec<OrderId>> {
        let mut expired: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| order.status.is_open() && order.is_expired_at(now_ns))
            .map(|order| order.id)
            .collect();
        expired.sort();

        for order_id in &expired {
            self.expire(*order_id, now_ns)?;
        }
        Ok(expired)
    }

    /// Forget closed orders whose last change is older than `closed_before_ns`
    ///
    /// Only orders whose terminal status has been recorded are dropped; an
    /// order that is merely past its deadline waits for `observe_expired`.
    pub fn evict_closed(&mut self, closed_before_ns: u64) -> Vec<LimitOrder> {
        let stale: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| order.status.is_terminal() && order.updated_at_ns < closed_before_ns)
            .map(|order| order.id)
            .collect();
        let evicted: Vec<LimitOrder> = stale
            .into_iter()
            .filter_map(|order_id| self.orders.remove(&order_id))
            .collect();
        if !evicted.is_empty() {
            debug!(pair = %self.pair, count = evicted.len(), "closed orders evicted");
        }
        evicted
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn best_bid(&self, now_ns: u64) -> Result<Option<PriceLevel>> {
        Ok(self.levels(Side::Bid, 1, now_ns)?.into_iter().next())
    }

    pub fn best_ask(&self, now_ns: u64) -> Result<Option<PriceLevel>> {
        Ok(self.levels(Side::Ask, 1, now_ns)?.into_iter().next())
    }

    /// Up to `max_levels` non-empty levels of `side`, best first
    pub fn levels(&self, side: Side, max_levels: usize, now_ns: u64) -> Result<Vec<PriceLevel>> {
        let mut levels = Vec::new();
        for (price, queue) in self.side_levels(side) {
            if levels.len() >= max_levels {
                break;
            }
            if let Some((level, _)) = self.aggregate(price, queue, now_ns)? {
                levels.push(level);
            }
        }
        Ok(levels)
    }

    /// Full depth of `side`, with each level's queue, for pricing a taker fill
    pub fn depth_snapshot(&self, side: Side, taker_fee: BasisPoints, now_ns: u64) -> Result<DepthSnapshot> {
        let mut levels = Vec::new();
        let mut queues = Vec::new();
        for (price, queue) in self.side_levels(side) {
            if let Some((level, resting)) = self.aggregate(price, queue, now_ns)? {
                levels.push(level);
                queues.push(resting);
            }
        }
        Ok(DepthSnapshot {
            pair: self.pair.clone(),
            side,
            levels,
            queues,
            taker_fee,
            taken_at_ns: now_ns,
        })
    }

    /// Open orders of `side` in matching priority
    pub fn queue(&self, side: Side, now_ns: u64) -> Vec<&LimitOrder> {
        self.side_levels(side)
            .flat_map(|(_, queue)| queue.iter())
            .filter_map(|id| self.orders.get(id))
            .filter(|order| order.is_matchable_at(now_ns))
            .collect()
    }

    pub fn orders(&self) -> impl Iterator<Item = &LimitOrder> {
        self.orders.values()
    }

    pub fn open_order_count(&self, now_ns: u64) -> usize {
        self.orders
            .values()
            .filter(|order| order.is_matchable_at(now_ns))
            .count()
    }

    fn side_levels(&self, side: Side) -> Box<dyn Iterator<Item = (Price, &VecDeque<OrderId>)> + '_> {
        match side {
            Side::Bid => Box::new(self.bids.iter().map(|(Reverse(price), queue)| (*price, queue))),
            Side::Ask => Box::new(self.asks.iter().map(|(price, queue)| (*price, queue))),
        }
    }

    fn aggregate(
        &self,
        price: Price,
        queue: &VecDeque<OrderId>,
        now_ns: u64,
    ) -> Result<Option<(PriceLevel, Vec<RestingOrder>)>> {
        let overflow = || FixedPointError::Overflow { context: "price level size" };
        let mut level = PriceLevel {
            price,
            base_amount: 0,
            quote_amount: 0,
            order_count: 0,
        };
        let mut resting = Vec::new();

        for order in queue
            .iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|order| order.is_matchable_at(now_ns))
        {
            let (base, quote) = match order.side {
                Side::Bid => (order.remaining_base()?, order.remaining_in),
                Side::Ask => (
                    order.remaining_in,
                    mul_div_ceil(order.remaining_in, price.raw(), Price::SCALE)?,
                ),
            };
            level.base_amount = level.base_amount.checked_add(base).ok_or_else(overflow)?;
            level.quote_amount = level.quote_amount.checked_add(quote).ok_or_else(overflow)?;
            level.order_count += 1;
            resting.push(RestingOrder {
                order_id: order.id,
                remaining_in: order.remaining_in,
            });
        }

        Ok((level.order_count > 0).then_some((level, resting)))
    }

    fn expire(&mut self, order_id: OrderId, now_ns: u64) -> Result<LimitOrder> {
        let order = self.close(order_id, OrderStatus::Expired, now_ns)?;
        debug!(%order_id, "order expired");
        Ok(order)
    }

    /// Transition to a terminal status and drop the id from its level
    fn close(&mut self, order_id: OrderId, status: OrderStatus, now_ns: u64) -> Result<LimitOrder> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(BookError::NotFound { order_id })?;
        order.transition(status, now_ns)?;
        let closed = order.clone();
        self.unlink(closed.side, closed.limit_price, order_id);
        Ok(closed)
    }

    fn unlink(&mut self, side: Side, price: Price, order_id: OrderId) {
        match side {
            Side::Bid => {
                if let Some(queue) = self.bids.get_mut(&Reverse(price)) {
                    queue.retain(|id| *id != order_id);
                    if queue.is_empty() {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Ask => {
                if let Some(queue) = self.asks.get_mut(&price) {
                    queue.retain(|id| *id != order_id);
                    if queue.is_empty() {
                        self.asks.remove(&price);
                    }
                }
            }
        }
    }
}
