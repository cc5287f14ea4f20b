//! Limit order lifecycle
//!
//! `Active -> PartiallyFilled -> Filled` through fill reports,
//! `Active | PartiallyFilled -> Cancelled` through owner cancellation and
//! `Active | PartiallyFilled -> Expired` once the deadline passes. The book
//! enforces the state machine; this layer adds risk gating, persistence and
//! bookkeeping around it.

use crate::collaborators::{PersistenceSink, RiskCheck};
use crate::error::{Result, RouterError};
use crate::stats::RouterStats;
use crate::{log_order, log_warning};
use orderbook::{BookError, OrderBookRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use types::{AssetPair, LimitOrder, OrderId, OrderRequest, OrderStatus};

/// Acknowledgement of a successful cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAck {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Repeat cancel; nothing changed
    pub already_cancelled: bool,
}

pub struct OrderLifecycleManager {
    books: Arc<OrderBookRegistry>,
    risk: Arc<dyn RiskCheck>,
    persistence: Arc<dyn PersistenceSink>,
    stats: Arc<RouterStats>,
}

impl OrderLifecycleManager {
    pub fn new(
        books: Arc<OrderBookRegistry>,
        risk: Arc<dyn RiskCheck>,
        persistence: Arc<dyn PersistenceSink>,
        stats: Arc<RouterStats>,
    ) -> Self {
        Self {
            books,
            risk,
            persistence,
            stats,
        }
    }

    pub fn books(&self) -> &Arc<OrderBookRegistry> {
        &self.books
    }

    /// Validate, risk-check and rest a new order
    pub async fn create(&self, request: OrderRequest) -> Result<LimitOrder> {
        self.books.validate(&request, self.books.now_ns())?;
        for asset in [&request.token_in, &request.token_out] {
            if self.risk.is_blocked(asset) {
                return Err(RouterError::AssetBlocked { asset: asset.clone() });
            }
        }

        let order = self.books.add_order(request)?;
        self.stats.record_order_created();
        log_order!(
            "Order {} created: {} {:?} {} at {} on {}",
            order.id,
            order.owner,
            order.side,
            order.amount_in,
            order.limit_price.raw(),
            order.pair
        );
        self.persist(&order).await;
        Ok(order)
    }

    /// Owner-only cancel; repeating it succeeds without change
    pub async fn cancel(&self, order_id: OrderId, requester: &str) -> Result<CancelAck> {
        let outcome = match self.books.cancel_order(order_id, requester) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.settle_rejection(e).await),
        };
        let ack = CancelAck {
            order_id,
            status: outcome.order.status,
            already_cancelled: outcome.already_cancelled,
        };
        if outcome.already_cancelled {
            debug!(%order_id, requester, "repeat cancel ignored");
            return Ok(ack);
        }
        self.stats.record_order_cancelled();
        log_order!("Order {} cancelled by {}", order_id, requester);
        self.persist(&outcome.order).await;
        Ok(ack)
    }

    /// Record `filled_in` of the order's input as settled
    pub async fn apply_fill(&self, order_id: OrderId, filled_in: u128) -> Result<LimitOrder> {
        let order = match self.books.apply_fill(order_id, filled_in) {
            Ok(order) => order,
            Err(e) => return Err(self.settle_rejection(e).await),
        };
        if order.status == OrderStatus::Filled {
            self.stats.record_order_filled();
            log_order!("Order {} filled", order_id);
        } else {
            debug!(%order_id, remaining = order.remaining_in, "order partially filled");
        }
        self.persist(&order).await;
        Ok(order)
    }

    /// Materialize expiry for past-deadline orders on `pair`
    pub async fn observe_expired(&self, pair: &AssetPair) -> Result<Vec<OrderId>> {
        let expired = self.books.observe_expired(pair)?;
        self.stats.record_orders_expired(expired.len());
        for order_id in &expired {
            if let Some(order) = self.books.get_order(*order_id) {
                self.persist(&order).await;
            }
        }
        Ok(expired)
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<LimitOrder> {
        self.books.get_order(order_id)
    }

    pub fn user_orders(&self, owner: &str, limit: usize) -> Vec<LimitOrder> {
        self.books.user_orders(owner, limit)
    }

    /// Record an expiry the book discovered while refusing an operation,
    /// then surface the refusal itself
    async fn settle_rejection(&self, error: BookError) -> RouterError {
        match error {
            BookError::ExpiredOnAccess { order, rejection } => {
                self.stats.record_orders_expired(1);
                log_order!("Order {} expired past deadline {:?}", order.id, order.deadline_ns);
                self.persist(&order).await;
                RouterError::from(*rejection)
            }
            other => other.into(),
        }
    }

    async fn persist(&self, order: &LimitOrder) {
        if let Err(e) = self.persistence.record_order(order).await {
            self.stats.record_persistence_failure();
            log_warning!("Failed to persist {} ({}): {}", order.id, order.status, e);
        }
    }
}
