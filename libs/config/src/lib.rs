//! # Smart Order Router Configuration
//!
//! Configuration loading and default values for the router service.
//!
//! ## Features
//!
//! - **Layered Loading**: base TOML, optional per-environment TOML, then
//!   `SOR_` environment variables
//! - **Service Defaults**: timeouts, fees and gas model constants
//! - **Validation**: every value checked before the service starts
//!
//! ## Usage
//!
//! ```rust
//! use config::RouterConfig;
//!
//! let config = RouterConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.order_book.default_taker_fee_bps, config::service::order_book::DEFAULT_TAKER_FEE_BPS);
//! ```

pub mod router_config;
pub mod service;

pub use router_config::{
    load_config, AmmConfig, FeeOverride, GasConfig, LoggingConfig, OrderBookConfig, RouterConfig,
    RoutingConfig,
};
