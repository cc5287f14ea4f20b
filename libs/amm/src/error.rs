//! AMM pricing errors

use thiserror::Error;
use types::{AssetPair, FixedPointError, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    #[error("Reserves must be positive (base={reserve_base}, quote={reserve_quote})")]
    InvalidReserves { reserve_base: u128, reserve_quote: u128 },

    #[error("Input amount must be positive")]
    ZeroInput,

    #[error("Insufficient liquidity: requested output {requested} with reserve {reserve_out}")]
    InsufficientLiquidity { requested: u128, reserve_out: u128 },

    #[error("Swap of {amount_in} for {amount_out} would shrink the pool invariant")]
    InvariantViolation { amount_in: u128, amount_out: u128 },

    #[error("Asset '{asset}' is not part of pool {pair}")]
    UnknownAsset { asset: String, pair: AssetPair },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

pub type Result<T> = std::result::Result<T, AmmError>;
