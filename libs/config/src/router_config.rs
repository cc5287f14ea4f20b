//! Router Configuration Module
//!
//! Loads [`RouterConfig`] from TOML files with environment-specific overrides
//! and `SOR_` environment variables. Every section has production defaults,
//! so a file only needs the values it changes.

use crate::service;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Upper bound (exclusive) for fee rates, and inclusive bound for tolerances
const BPS_DENOMINATOR: u32 = 10_000;

/// Main router configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub routing: RoutingConfig,
    pub order_book: OrderBookConfig,
    pub amm: AmmConfig,
    pub gas: GasConfig,
    pub logging: LoggingConfig,
}

/// Route selection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Per-venue query timeout (milliseconds)
    pub venue_timeout_ms: u64,
    /// Quote validity window (milliseconds)
    pub quote_validity_ms: u64,
    /// Largest depth a snapshot request may ask for
    pub max_snapshot_depth: usize,
}

/// Order book settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookConfig {
    /// Taker fee for pairs without an override (basis points)
    pub default_taker_fee_bps: u32,
    pub fee_overrides: Vec<FeeOverride>,
    /// Expiry and eviction sweep period (milliseconds)
    pub sweep_interval_ms: u64,
    /// Closed orders older than this are evicted by the sweep (milliseconds)
    pub closed_order_retention_ms: u64,
}

/// Taker fee for one pair; token order does not matter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeOverride {
    pub token_a: String,
    pub token_b: String,
    pub taker_fee_bps: u32,
}

/// AMM settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmConfig {
    /// JSON file of pools to register at startup
    pub pool_seed_path: Option<PathBuf>,
}

/// Gas model used for quote estimates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    pub amm_swap: u64,
    pub order_book_base: u64,
    pub order_book_per_level: u64,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            venue_timeout_ms: service::routing::DEFAULT_VENUE_TIMEOUT_MS,
            quote_validity_ms: service::routing::DEFAULT_QUOTE_VALIDITY_MS,
            max_snapshot_depth: service::routing::MAX_SNAPSHOT_DEPTH,
        }
    }
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            default_taker_fee_bps: service::order_book::DEFAULT_TAKER_FEE_BPS,
            fee_overrides: Vec::new(),
            sweep_interval_ms: service::order_book::DEFAULT_SWEEP_INTERVAL_MS,
            closed_order_retention_ms: service::order_book::DEFAULT_CLOSED_ORDER_RETENTION_MS,
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            amm_swap: service::gas::AMM_SWAP,
            order_book_base: service::gas::ORDER_BOOK_BASE,
            order_book_per_level: service::gas::ORDER_BOOK_PER_LEVEL,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from files with environment overrides
    ///
    /// `environment` selects `<base dir>/environments/<env>.toml`, applied on
    /// top of the base file when it exists.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/router.toml"));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // SOR_ROUTING__VENUE_TIMEOUT_MS=500 overrides routing.venue_timeout_ms
        builder = builder.add_source(
            Environment::with_prefix("SOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Defaults with the common knobs overridden from the process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Override the common knobs from `lookup`; unparsable values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(service::env::VENUE_TIMEOUT_MS) {
            match value.parse::<u64>() {
                Ok(ms) => self.routing.venue_timeout_ms = ms,
                Err(_) => warn!("Ignoring invalid {}: {}", service::env::VENUE_TIMEOUT_MS, value),
            }
        }

        if let Some(value) = lookup(service::env::DEFAULT_TAKER_FEE_BPS) {
            match value.parse::<u32>() {
                Ok(bps) => self.order_book.default_taker_fee_bps = bps,
                Err(_) => warn!("Ignoring invalid {}: {}", service::env::DEFAULT_TAKER_FEE_BPS, value),
            }
        }

        if let Some(value) = lookup(service::env::SWEEP_INTERVAL_MS) {
            match value.parse::<u64>() {
                Ok(ms) => self.order_book.sweep_interval_ms = ms,
                Err(_) => warn!("Ignoring invalid {}: {}", service::env::SWEEP_INTERVAL_MS, value),
            }
        }

        if let Some(path) = lookup(service::env::POOL_SEED_PATH) {
            self.amm.pool_seed_path = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup(service::env::LOG_LEVEL) {
            self.logging.level = level;
        }

        if let Some(json) = lookup(service::env::LOG_JSON) {
            self.logging.json = json.eq_ignore_ascii_case("true") || json == "1";
        }
    }

    /// Expand `~` and `$VAR` in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(path) = &self.amm.pool_seed_path {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(&raw).context("Failed to expand pool seed path")?;
            self.amm.pool_seed_path = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.routing.venue_timeout_ms == 0 {
            bail!("routing.venue_timeout_ms must be positive");
        }
        if self.routing.quote_validity_ms == 0 {
            bail!("routing.quote_validity_ms must be positive");
        }
        if self.routing.max_snapshot_depth == 0 {
            bail!("routing.max_snapshot_depth must be positive");
        }

        if self.order_book.default_taker_fee_bps >= BPS_DENOMINATOR {
            bail!(
                "order_book.default_taker_fee_bps must be < {} (got {})",
                BPS_DENOMINATOR,
                self.order_book.default_taker_fee_bps
            );
        }
        if self.order_book.sweep_interval_ms == 0 {
            bail!("order_book.sweep_interval_ms must be positive");
        }
        for fee in &self.order_book.fee_overrides {
            if fee.token_a.is_empty() || fee.token_b.is_empty() {
                bail!("fee override tokens must not be empty");
            }
            if fee.token_a == fee.token_b {
                bail!("fee override for {} names the same token twice", fee.token_a);
            }
            if fee.taker_fee_bps >= BPS_DENOMINATOR {
                bail!(
                    "fee override {}/{} must be < {} bps (got {})",
                    fee.token_a,
                    fee.token_b,
                    BPS_DENOMINATOR,
                    fee.taker_fee_bps
                );
            }
        }

        if self.gas.amm_swap == 0 || self.gas.order_book_base == 0 {
            bail!("gas estimates must be positive");
        }

        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }

        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Load, expand and validate configuration
pub fn load_config(base_path: Option<&Path>, environment: Option<&str>) -> Result<RouterConfig> {
    let mut config = RouterConfig::load(base_path, environment)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_validation() {
        assert!(RouterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("router.toml");

        let config_content = r#"
[routing]
venue_timeout_ms = 75

[order_book]
default_taker_fee_bps = 10

[[order_book.fee_overrides]]
token_a = "usei"
token_b = "uatom"
taker_fee_bps = 5

[logging]
json = true
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = RouterConfig::load(Some(&config_path), None).unwrap();
        assert_eq!(config.routing.venue_timeout_ms, 75);
        assert_eq!(
            config.routing.quote_validity_ms,
            service::routing::DEFAULT_QUOTE_VALIDITY_MS
        );
        assert_eq!(config.order_book.default_taker_fee_bps, 10);
        assert_eq!(config.order_book.fee_overrides[0].taker_fee_bps, 5);
        assert_eq!(
            config.order_book.closed_order_retention_ms,
            service::order_book::DEFAULT_CLOSED_ORDER_RETENTION_MS
        );
        assert_eq!(config.gas, GasConfig::default());
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("router.toml");
        fs::write(&config_path, "[routing]\nvenue_timeout_ms = 75\n").unwrap();
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("staging.toml"),
            "[routing]\nvenue_timeout_ms = 400\n",
        )
        .unwrap();

        let staging = RouterConfig::load(Some(&config_path), Some("staging")).unwrap();
        assert_eq!(staging.routing.venue_timeout_ms, 400);

        // Missing environment file falls back to the base
        let other = RouterConfig::load(Some(&config_path), Some("prod")).unwrap();
        assert_eq!(other.routing.venue_timeout_ms, 75);
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("router.toml");
        let mut config = RouterConfig::default();
        config.amm.pool_seed_path = Some(PathBuf::from("/var/lib/sor/pools.json"));
        fs::write(&config_path, toml::to_string(&config).unwrap()).unwrap();

        assert_eq!(RouterConfig::load(Some(&config_path), None).unwrap(), config);
    }

    #[test]
    fn test_missing_base_file_fails() {
        let dir = tempdir().unwrap();
        assert!(RouterConfig::load(Some(&dir.path().join("absent.toml")), None).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (service::env::VENUE_TIMEOUT_MS, "900"),
            (service::env::DEFAULT_TAKER_FEE_BPS, "not-a-number"),
            (service::env::LOG_JSON, "TRUE"),
            (service::env::SWEEP_INTERVAL_MS, "250"),
            (service::env::POOL_SEED_PATH, "~/pools.json"),
        ]
        .into_iter()
        .collect();

        let mut config = RouterConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.routing.venue_timeout_ms, 900);
        assert_eq!(
            config.order_book.default_taker_fee_bps,
            service::order_book::DEFAULT_TAKER_FEE_BPS
        );
        assert!(config.logging.json);
        assert_eq!(config.order_book.sweep_interval_ms, 250);

        config.expand_env_vars().unwrap();
        let seed = config.amm.pool_seed_path.unwrap();
        assert!(!seed.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = RouterConfig::default();
        config.order_book.default_taker_fee_bps = 10_000;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.routing.venue_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.order_book.sweep_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.order_book.fee_overrides.push(FeeOverride {
            token_a: "usei".to_string(),
            token_b: "usei".to_string(),
            taker_fee_bps: 5,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_loads() {
        let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/router.toml");
        let config = load_config(Some(base.as_path()), Some("production")).unwrap();
        assert_eq!(config.routing.venue_timeout_ms, 150);
        assert_eq!(config.order_book.fee_overrides.len(), 1);
        assert!(config.logging.json);
    }
}
