//! # Identifier System - Asset Pairs + Typed ID Wrappers
//!
//! Two families of identifiers:
//!
//! ### 1. Opaque asset identifiers
//! - Chain-native addresses (`0x...`) or denominations (`usei`, `factory/...`)
//! - Carry no meaning beyond equality and ordering
//! - [`AssetPair`] orders two of them into a canonical (base, quote) key so
//!   that both directions of a swap land on the same book and pool
//!
//! ### 2. Typed simple IDs
//! - Zero-cost wrappers for `u64` identifiers
//! - Compile-time type safety for orders and quotes
//! - Transparent serialization as raw `u64`
//!
//! ```rust
//! use types::{AssetPair, OrderId};
//!
//! let pair = AssetPair::canonical("usdc", "weth").unwrap();
//! assert_eq!(pair.base(), "usdc");
//!
//! let order = OrderId::new(12345);
//! assert_eq!(order.inner(), 12345);
//! ```

use crate::common::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro for generating zero-cost typed ID wrappers
///
/// Creates a new type that wraps `u64` with complete type safety while maintaining
/// identical runtime performance and memory layout.
#[macro_export]
macro_rules! define_typed_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new typed ID
            #[inline(always)]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Extract the inner u64 value
            #[inline(always)]
            pub const fn inner(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            #[inline(always)]
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            #[inline(always)]
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        // Serializes as raw u64
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                u64::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_typed_id!(
    /// Unique identifier for a resting limit order
    OrderId
);

define_typed_id!(
    /// Unique identifier for a swap quote
    QuoteId
);

/// Canonical (base, quote) key for one market
///
/// Constructed through [`AssetPair::canonical`], which puts the
/// lexicographically smaller identifier first. Both swap directions between
/// two assets therefore share one order book and one pool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    base: String,
    quote: String,
}

/// Which leg of a pair an asset is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairLeg {
    Base,
    Quote,
}

impl AssetPair {
    /// Build the canonical pair for two distinct, non-empty assets
    pub fn canonical(a: impl Into<String>, b: impl Into<String>) -> Result<Self, ValidationError> {
        let a = a.into();
        let b = b.into();
        if a.is_empty() {
            return Err(ValidationError::EmptyIdentifier { field: "token_in" });
        }
        if b.is_empty() {
            return Err(ValidationError::EmptyIdentifier { field: "token_out" });
        }
        if a == b {
            return Err(ValidationError::SameAsset { asset: a });
        }
        let (base, quote) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Which leg `asset` is, or `None` if it is not part of this pair
    pub fn leg_of(&self, asset: &str) -> Option<PairLeg> {
        if asset == self.base {
            Some(PairLeg::Base)
        } else if asset == self.quote {
            Some(PairLeg::Quote)
        } else {
            None
        }
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.leg_of(asset).is_some()
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ordering_is_direction_independent() {
        let a = AssetPair::canonical("0x9876", "0x1234").unwrap();
        let b = AssetPair::canonical("0x1234", "0x9876").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.base(), "0x1234");
        assert_eq!(a.quote(), "0x9876");
    }

    #[test]
    fn test_canonical_rejects_bad_identifiers() {
        assert_eq!(
            AssetPair::canonical("", "usei"),
            Err(ValidationError::EmptyIdentifier { field: "token_in" })
        );
        assert_eq!(
            AssetPair::canonical("usei", "usei"),
            Err(ValidationError::SameAsset { asset: "usei".to_string() })
        );
    }

    #[test]
    fn test_legs() {
        let pair = AssetPair::canonical("usei", "factory/sei1abc/test").unwrap();
        assert_eq!(pair.leg_of("factory/sei1abc/test"), Some(PairLeg::Base));
        assert_eq!(pair.leg_of("uatom"), None);
    }

    #[test]
    fn test_typed_id_serializes_as_u64() {
        let id = OrderId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(serde_json::from_str::<OrderId>("42").unwrap(), id);
    }
}
