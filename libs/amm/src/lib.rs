//! # AMM Library - Exact Constant-Product Pricing
//!
//! ## Purpose
//!
//! Pricing engine for constant-product (x*y=k) liquidity pools. Computes swap
//! outputs, required inputs, marginal prices and price impact with exact
//! integer arithmetic on 256-bit intermediates.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool snapshots registered through [`PoolRegistry::upsert`]
//! - **Output Destinations**: The route selector's AMM venue
//! - **Precision**: Raw native units (18 decimals WETH, 6 USDC), no floating point
//!
//! ## Invariants
//!
//! - Quotes never mutate reserves
//! - For any simulated swap `k_after >= k_before`
//! - Output never exceeds the pre-trade marginal rate applied to the
//!   fee-adjusted input

pub mod constant_product;
pub mod error;
pub mod pool;
pub mod pool_traits;
pub mod registry;

pub use constant_product::ConstantProductMath;
pub use error::{AmmError, Result};
pub use pool::PoolState;
pub use pool_traits::{AmmPool, PoolType, SwapSimulation};
pub use registry::{PoolRegistry, RegistryStats};
