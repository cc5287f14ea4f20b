//! Router error types

use crate::collaborators::CollaboratorError;
use amm::AmmError;
use orderbook::BookError;
use thiserror::Error;
use types::{AssetPair, FixedPointError, OrderId, OrderStateError, QuoteId, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{requester} is not authorized to modify {order_id}")]
    Unauthorized { order_id: OrderId, requester: String },

    #[error("{order_id} not found among open orders")]
    NotFound { order_id: OrderId },

    #[error("No route for {pair}: no venue can fill the request")]
    NoRoute { pair: AssetPair },

    /// At least one venue failed and none produced a quote
    #[error("Venues unavailable for {pair}: {reason}")]
    VenueUnavailable { pair: AssetPair, reason: String },

    #[error("Asset '{asset}' is blocked by risk checks")]
    AssetBlocked { asset: String },

    #[error("Slippage {slippage_bps} bps exceeds tolerance of {max_slippage_bps} bps")]
    ExceedsSlippageTolerance { slippage_bps: u32, max_slippage_bps: u32 },

    #[error("Output {amount_out} is below the requested minimum {min_amount_out}")]
    InsufficientOutput { amount_out: u128, min_amount_out: u128 },

    #[error("{quote_id} expired at {valid_until_ns}")]
    QuoteExpired { quote_id: QuoteId, valid_until_ns: u64 },

    #[error("Execution failed: {0}")]
    Execution(CollaboratorError),

    #[error("Invalid pool: {0}")]
    InvalidPool(AmmError),

    #[error(transparent)]
    OrderState(#[from] OrderStateError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

impl RouterError {
    /// Whether the same request may succeed if retried unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, RouterError::VenueUnavailable { .. })
    }
}

impl From<BookError> for RouterError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(e) => RouterError::Validation(e),
            BookError::Unauthorized { order_id, requester } => {
                RouterError::Unauthorized { order_id, requester }
            }
            BookError::NotFound { order_id } => RouterError::NotFound { order_id },
            BookError::State(e) => RouterError::OrderState(e),
            BookError::FixedPoint(e) => RouterError::FixedPoint(e),
            BookError::ExpiredOnAccess { rejection, .. } => RouterError::from(*rejection),
        }
    }
}

impl From<AmmError> for RouterError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::Validation(e) => RouterError::Validation(e),
            AmmError::FixedPoint(e) => RouterError::FixedPoint(e),
            other => RouterError::InvalidPool(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use types::{LimitOrder, OrderStatus, Price, Side};

    fn expired_order(id: OrderId) -> LimitOrder {
        LimitOrder {
            id,
            owner: "alice".to_string(),
            pair: AssetPair::canonical("eth", "usdc").unwrap(),
            side: Side::Ask,
            token_in: "eth".to_string(),
            token_out: "usdc".to_string(),
            amount_in: 10,
            remaining_in: 10,
            limit_price: Price::from_raw(1),
            status: OrderStatus::Expired,
            created_at_ns: 1,
            updated_at_ns: 5,
            deadline_ns: Some(5),
            sequence: 1,
        }
    }

    #[test]
    fn test_only_venue_unavailable_is_retryable() {
        let pair = AssetPair::canonical("a", "b").unwrap();
        assert!(RouterError::VenueUnavailable { pair: pair.clone(), reason: "timeout".into() }
            .is_retryable());
        assert!(!RouterError::NoRoute { pair }.is_retryable());
        assert!(!RouterError::AssetBlocked { asset: "a".into() }.is_retryable());
        assert!(!RouterError::InsufficientOutput { amount_out: 1, min_amount_out: 2 }.is_retryable());
    }

    #[test]
    fn test_book_errors_map_to_router_variants() {
        let order_id = OrderId::new(7);
        let err: RouterError = BookError::Unauthorized { order_id, requester: "mallory".into() }.into();
        assert_eq!(err, RouterError::Unauthorized { order_id, requester: "mallory".into() });

        let err: RouterError = BookError::ExpiredOnAccess {
            order: Box::new(expired_order(order_id)),
            rejection: Box::new(BookError::NotFound { order_id }),
        }
        .into();
        assert_eq!(err, RouterError::NotFound { order_id });
        let err: RouterError = BookError::NotFound { order_id }.into();
        assert_eq!(err, RouterError::NotFound { order_id });

        let err: RouterError = BookError::Validation(ValidationError::NonPositivePrice).into();
        assert_eq!(err, RouterError::Validation(ValidationError::NonPositivePrice));
    }

    #[test]
    fn test_pool_errors_keep_validation_separate() {
        let err: RouterError = AmmError::InvalidReserves { reserve_base: 0, reserve_quote: 1 }.into();
        assert!(matches!(err, RouterError::InvalidPool(_)));
    }
}
