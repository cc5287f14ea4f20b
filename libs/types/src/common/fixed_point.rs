//! Fixed-point arithmetic types for exact amount and price calculations
//!
//! Amounts are raw integer units of an asset's native decimals (`u128`).
//! Prices are scaled integers. Every multiply-then-divide goes through a
//! 256-bit intermediate so that no product of two amounts can overflow, and
//! every division truncates toward zero unless the `_ceil` variant is used.
//!
//! ## Design Principles
//!
//! - **No Precision Loss**: All values stored as scaled integers
//! - **Overflow Protection**: Results outside `u128` are errors, never wrapped
//! - **Type Safety**: `Price` and `BasisPoints` cannot be mixed with raw amounts
//! - **Determinism**: No floating point anywhere in the arithmetic path

use crate::common::errors::{FixedPointError, ValidationError};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Denominator for basis-point arithmetic (10000 bps = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `a * b / denominator`, truncating, computed on a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, FixedPointError> {
    if denominator == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let result = U256::from(a) * U256::from(b) / U256::from(denominator);
    narrow(result, "mul_div result")
}

/// `a * b / denominator`, rounding up
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128, FixedPointError> {
    if denominator == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut result = product / denominator;
    if !(product % denominator).is_zero() {
        result += U256::one();
    }
    narrow(result, "mul_div_ceil result")
}

/// Narrow a 256-bit intermediate back to the amount range
pub fn narrow(value: U256, context: &'static str) -> Result<u128, FixedPointError> {
    if value.bits() > 128 {
        return Err(FixedPointError::Overflow { context });
    }
    Ok(value.low_u128())
}

/// Parse a human-readable decimal string into raw units of an asset with
/// `decimals` fractional digits. Rejects negative values and inputs that
/// would need rounding.
pub fn amount_from_decimal_str(input: &str, decimals: u32) -> Result<u128, FixedPointError> {
    let decimal = Decimal::from_str(input.trim()).map_err(|_| FixedPointError::InvalidDecimal {
        input: input.to_string(),
    })?;
    if decimal.is_sign_negative() {
        return Err(FixedPointError::InvalidDecimal {
            input: input.to_string(),
        });
    }

    let normalized = decimal.normalize();
    let scale = normalized.scale();
    if scale > decimals {
        return Err(FixedPointError::PrecisionLoss {
            input: input.to_string(),
            decimals,
        });
    }

    let mantissa = u128::try_from(normalized.mantissa()).map_err(|_| FixedPointError::InvalidDecimal {
        input: input.to_string(),
    })?;
    let factor = 10u128
        .checked_pow(decimals - scale)
        .ok_or(FixedPointError::Overflow { context: "decimal scale factor" })?;
    mantissa
        .checked_mul(factor)
        .ok_or(FixedPointError::Overflow { context: "decimal amount" })
}

/// Render raw units as a decimal string for logs. Falls back to the raw
/// integer when the value exceeds the decimal range.
pub fn format_amount(raw: u128, decimals: u32) -> String {
    i128::try_from(raw)
        .ok()
        .and_then(|raw| Decimal::try_from_i128_with_scale(raw, decimals).ok())
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Quote-per-base price scaled by [`Price::SCALE`]
///
/// A price `p` means `p` raw units of the quote asset buy `10^18` raw units of
/// the base asset, so `quote_out = base_in * p / 10^18`.
///
/// Examples (USDC quote with 6 decimals, WETH base with 18 decimals):
/// - 1500 USDC per WETH = `Price(1_500_000_000)`
/// - 1.5 USDC per WETH = `Price(1_500_000)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub u128);

impl Price {
    /// Scale factor: one whole unit of base in raw 18-decimal terms
    pub const SCALE: u128 = 1_000_000_000_000_000_000;

    /// Zero price (never valid for an order)
    pub const ZERO: Self = Self(0);

    /// Create from raw scaled integer
    #[inline]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Get the raw scaled integer value
    #[inline]
    pub const fn raw(self) -> u128 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Price implied by exchanging `base` for `quote`: `quote * SCALE / base`
    pub fn from_ratio(quote: u128, base: u128) -> Result<Self, FixedPointError> {
        mul_div(quote, Self::SCALE, base).map(Self)
    }

    /// Quote received for selling `base` at this price (truncating)
    pub fn quote_for_base(self, base: u128) -> Result<u128, FixedPointError> {
        mul_div(base, self.0, Self::SCALE)
    }

    /// Base received for spending `quote` at this price (truncating)
    pub fn base_for_quote(self, quote: u128) -> Result<u128, FixedPointError> {
        mul_div(quote, Self::SCALE, self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_amount(self.0, 18))
    }
}

/// A rate or ratio expressed in basis points (1 bps = 0.01%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct BasisPoints(pub u32);

impl BasisPoints {
    /// 100%
    pub const MAX: u32 = 10_000;

    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(bps: u32) -> Self {
        Self(bps)
    }

    /// Validate a fee rate: `0 <= rate < 10000`
    pub fn fee_rate(bps: u32) -> Result<Self, ValidationError> {
        if bps >= Self::MAX {
            return Err(ValidationError::BasisPointsOutOfRange {
                value: bps,
                max: Self::MAX,
            });
        }
        Ok(Self(bps))
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// `10000 - self`, the multiplier kept after a fee of this rate
    #[inline]
    pub fn complement(self) -> u128 {
        BPS_DENOMINATOR.saturating_sub(u128::from(self.0))
    }

    /// `amount * self / 10000`, truncating
    pub fn apply(self, amount: u128) -> Result<u128, FixedPointError> {
        mul_div(amount, u128::from(self.0), BPS_DENOMINATOR)
    }

    /// Ratio `(numerator / denominator)` in basis points, truncating and
    /// saturating at `u32::MAX`. Computed on 256-bit intermediates.
    pub fn from_ratio_wide(numerator: U256, denominator: U256) -> Result<Self, FixedPointError> {
        if denominator.is_zero() {
            return Err(FixedPointError::DivisionByZero);
        }
        let bps = numerator
            .checked_mul(U256::from(BPS_DENOMINATOR))
            .ok_or(FixedPointError::Overflow { context: "basis point ratio" })?
            / denominator;
        if bps > U256::from(u32::MAX) {
            return Ok(Self(u32::MAX));
        }
        Ok(Self(bps.low_u32()))
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 1500e6 * 0.997e18 overflows u64 but not the 256-bit intermediate
        let out = mul_div(1_500_000_000, 997_000_000_000_000_000, 1_000_997_000_000_000_000_000).unwrap();
        assert_eq!(out, 1_494_010);

        // Product of two near-max amounts still divides back exactly
        let big = u128::MAX / 3;
        assert_eq!(mul_div(big, big, big).unwrap(), big);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div(1, 1, 0), Err(FixedPointError::DivisionByZero));
        assert!(matches!(
            mul_div(u128::MAX, 2, 1),
            Err(FixedPointError::Overflow { .. })
        ));
    }

    #[test]
    fn test_mul_div_ceil_rounds_up_only_on_remainder() {
        assert_eq!(mul_div_ceil(10, 10, 3).unwrap(), 34);
        assert_eq!(mul_div_ceil(10, 9, 3).unwrap(), 30);
    }

    #[test]
    fn test_price_conversions() {
        let price = Price::from_raw(1_500_000);
        assert_eq!(price.quote_for_base(1_000_000_000_000_000_000).unwrap(), 1_500_000);
        assert_eq!(price.base_for_quote(1_500_000).unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(
            Price::from_ratio(1_500_000_000, 1_000_000_000_000_000_000_000).unwrap(),
            Price::from_raw(1_500_000)
        );
    }

    #[test]
    fn test_fee_rate_bounds() {
        assert!(BasisPoints::fee_rate(0).is_ok());
        assert!(BasisPoints::fee_rate(9_999).is_ok());
        assert_eq!(
            BasisPoints::fee_rate(10_000),
            Err(ValidationError::BasisPointsOutOfRange { value: 10_000, max: 10_000 })
        );
    }

    #[test]
    fn test_bps_apply_truncates() {
        // 999 * 25 / 10000 = 2.4975 -> 2
        assert_eq!(BasisPoints::new(25).apply(999).unwrap(), 2);
        assert_eq!(BasisPoints::new(25).apply(1_000_000_000_000_000_000).unwrap(), 2_500_000_000_000_000);
    }

    #[test]
    fn test_amount_from_decimal_str() {
        assert_eq!(amount_from_decimal_str("1000", 18).unwrap(), 1_000_000_000_000_000_000_000);
        assert_eq!(amount_from_decimal_str("1500.25", 6).unwrap(), 1_500_250_000);
        assert_eq!(amount_from_decimal_str("0.10", 1).unwrap(), 1);
        assert!(matches!(
            amount_from_decimal_str("0.0000001", 6),
            Err(FixedPointError::PrecisionLoss { .. })
        ));
        assert!(matches!(
            amount_from_decimal_str("-1", 6),
            Err(FixedPointError::InvalidDecimal { .. })
        ));
        assert!(matches!(
            amount_from_decimal_str("abc", 6),
            Err(FixedPointError::InvalidDecimal { .. })
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_250_000, 6), "1500.25");
        assert_eq!(format_amount(u128::MAX, 18), u128::MAX.to_string());
    }

    #[test]
    fn test_decimal_conversion_is_exact() {
        use rust_decimal_macros::dec;

        let raw = amount_from_decimal_str(&dec!(0.997).to_string(), 18).unwrap();
        assert_eq!(raw, 997_000_000_000_000_000);
        let rendered: Decimal = format_amount(raw, 18).parse().unwrap();
        assert_eq!(rendered, dec!(0.997));
    }

    proptest::proptest! {
        #[test]
        fn prop_ceil_is_floor_or_floor_plus_one(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, d in 1u128..u64::MAX as u128) {
            let floor = mul_div(a, b, d).unwrap();
            let ceil = mul_div_ceil(a, b, d).unwrap();
            proptest::prop_assert!(ceil == floor || ceil == floor + 1);
        }
    }
}
