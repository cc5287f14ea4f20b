//! Error types for fixed-point arithmetic and input validation
//!
//! Overflow, division by zero and conversion failures in amount/price math,
//! plus the validation failures every entry point reports before it mutates
//! any state.

use thiserror::Error;

/// Reasons a request or order is rejected before any state mutation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An asset identifier or owner was empty
    #[error("{field} must not be empty")]
    EmptyIdentifier { field: &'static str },

    /// Both legs of a swap or order name the same asset
    #[error("token_in and token_out must differ (both are '{asset}')")]
    SameAsset { asset: String },

    /// Amount is zero
    #[error("{field} must be strictly positive")]
    NonPositiveAmount { field: &'static str },

    /// Limit price is zero
    #[error("limit price must be strictly positive")]
    NonPositivePrice,

    /// The order's size on the other leg rounds to zero at its limit price
    #[error("{amount_in} at limit price {limit_price} rounds to nothing on the other leg")]
    DustOrder { amount_in: u128, limit_price: u128 },

    /// Deadline is not in the future
    #[error("deadline {deadline_ns} is not after current time {now_ns}")]
    DeadlineInPast { deadline_ns: u64, now_ns: u64 },

    /// Basis-point value outside [0, 10000)
    #[error("basis points {value} out of range (must be < {max})")]
    BasisPointsOutOfRange { value: u32, max: u32 },

    /// Custom validation failure with message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

/// Errors that can occur during fixed-point arithmetic operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    /// Result does not fit the 128-bit amount range
    #[error("Overflow: {context} exceeds the representable amount range")]
    Overflow { context: &'static str },

    /// Invalid decimal string format
    #[error("Invalid decimal string: '{input}' - expected numeric format")]
    InvalidDecimal { input: String },

    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,

    /// Decimal string has more fractional digits than the asset supports
    #[error("Precision loss: '{input}' has more than {decimals} fractional digits")]
    PrecisionLoss { input: String, decimals: u32 },
}
