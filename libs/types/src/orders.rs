//! Limit order model and its state machine
//!
//! ```text
//! Active ──fill──▶ PartiallyFilled ──fill──▶ Filled
//!   │                   │
//!   ├──cancel───────────┼──▶ Cancelled
//!   └──deadline passes──┴──▶ Expired
//! ```
//!
//! `Filled`, `Cancelled` and `Expired` are terminal. `amount_in` and
//! `limit_price` never change after creation; only `status`,
//! `updated_at_ns` and `remaining_in` do.

use crate::common::errors::FixedPointError;
use crate::common::fixed_point::Price;
use crate::common::identifiers::{AssetPair, OrderId, PairLeg};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Book side of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Pays quote for base
    Bid,
    /// Sells base for quote
    Ask,
}

impl Side {
    /// Side of a maker order that gives up `token_in`
    pub fn for_maker_input(pair: &AssetPair, token_in: &str) -> Option<Self> {
        match pair.leg_of(token_in)? {
            PairLeg::Base => Some(Side::Ask),
            PairLeg::Quote => Some(Side::Bid),
        }
    }

    /// Resting side consumed by a taker that gives up `token_in`
    pub fn consumed_by_taker(pair: &AssetPair, token_in: &str) -> Option<Self> {
        match pair.leg_of(token_in)? {
            PairLeg::Base => Some(Side::Bid),
            PairLeg::Quote => Some(Side::Ask),
        }
    }
}

/// Lifecycle status of a limit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    PartiallyFilled,
    Filled,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Expired)
    }

    /// Active or partially filled
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Active, PartiallyFilled | Filled | Cancelled | Expired) => true,
            (PartiallyFilled, PartiallyFilled | Filled | Cancelled | Expired) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Active => "active",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Rejected state changes on a single order
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderStateError {
    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("fill of {requested} exceeds remaining {remaining} on order {order_id}")]
    FillExceedsRemaining {
        order_id: OrderId,
        requested: u128,
        remaining: u128,
    },

    #[error("fill amount must be strictly positive")]
    EmptyFill,
}

/// A resting limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: OrderId,
    pub owner: String,
    pub pair: AssetPair,
    pub side: Side,
    /// Asset the maker gives up
    pub token_in: String,
    /// Asset the maker receives
    pub token_out: String,
    /// Original input amount, immutable
    pub amount_in: u128,
    /// Input still available for matching
    pub remaining_in: u128,
    /// Quote-per-base limit, immutable
    pub limit_price: Price,
    pub status: OrderStatus,
    pub created_at_ns: u64,
    pub updated_at_ns: u64,
    pub deadline_ns: Option<u64>,
    /// Book-local insertion sequence; time priority within a price level
    pub sequence: u64,
}

impl LimitOrder {
    /// Past its deadline at `now_ns`
    pub fn is_expired_at(&self, now_ns: u64) -> bool {
        matches!(self.deadline_ns, Some(deadline) if deadline <= now_ns)
    }

    /// Status as observed at `now_ns`: open orders past their deadline read
    /// as `Expired` even before the transition is recorded
    pub fn status_at(&self, now_ns: u64) -> OrderStatus {
        if self.status.is_open() && self.is_expired_at(now_ns) {
            OrderStatus::Expired
        } else {
            self.status
        }
    }

    /// Eligible for best-price queries and matching
    pub fn is_matchable_at(&self, now_ns: u64) -> bool {
        self.status_at(now_ns).is_open() && self.remaining_in > 0
    }

    /// Remaining size in base units (asks hold base, bids hold quote)
    pub fn remaining_base(&self) -> Result<u128, FixedPointError> {
        match self.side {
            Side::Ask => Ok(self.remaining_in),
            Side::Bid => self.limit_price.base_for_quote(self.remaining_in),
        }
    }

    /// Move to `next`, enforcing the state machine
    pub fn transition(&mut self, next: OrderStatus, now_ns: u64) -> Result<(), OrderStateError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderStateError::InvalidTransition {
                order_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at_ns = now_ns;
        Ok(())
    }

    /// Consume `filled_in` of the remaining input. Returns the new status.
    pub fn apply_fill(&mut self, filled_in: u128, now_ns: u64) -> Result<OrderStatus, OrderStateError> {
        if filled_in == 0 {
            return Err(OrderStateError::EmptyFill);
        }
        if filled_in > self.remaining_in {
            return Err(OrderStateError::FillExceedsRemaining {
                order_id: self.id,
                requested: filled_in,
                remaining: self.remaining_in,
            });
        }
        let next = if filled_in == self.remaining_in {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(next, now_ns)?;
        self.remaining_in -= filled_in;
        Ok(next)
    }
}

/// Request to place a limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub owner: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub limit_price: Price,
    pub deadline_ns: Option<u64>,
}
