//! Order book errors

use thiserror::Error;
use types::{FixedPointError, LimitOrder, OrderId, OrderStateError, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{requester} is not the owner of {order_id}")]
    Unauthorized { order_id: OrderId, requester: String },

    /// Unknown id, or no longer active or partially filled
    #[error("{order_id} not found among open orders")]
    NotFound { order_id: OrderId },

    #[error(transparent)]
    State(#[from] OrderStateError),

    /// The request met an order past its deadline. The order has just been
    /// closed as `Expired`; `rejection` is the answer to the request itself.
    #[error("{rejection}")]
    ExpiredOnAccess {
        order: Box<LimitOrder>,
        rejection: Box<BookError>,
    },

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

pub type Result<T> = std::result::Result<T, BookError>;
