use anyhow::{Context, Result};
use config::service::env;
use config::{load_config, RouterConfig};
use smart_order_router::logging::{init_tracing, LogEmoji};
use smart_order_router::{load_pool_seed, log_error, log_success, SmartOrderRouter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use types::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    let config = resolve_config()?;
    init_tracing(&config.logging);

    info!("{} Starting Smart Order Router...", LogEmoji::START);
    info!(
        venue_timeout_ms = config.routing.venue_timeout_ms,
        quote_validity_ms = config.routing.quote_validity_ms,
        default_taker_fee_bps = config.order_book.default_taker_fee_bps,
        fee_overrides = config.order_book.fee_overrides.len(),
        "configuration loaded"
    );
    match config.to_json_pretty() {
        Ok(effective) => debug!("Effective configuration:\n{}", effective),
        Err(e) => warn!("Failed to render configuration: {:#}", e),
    }

    let router = Arc::new(SmartOrderRouter::new(config.clone()).context("Failed to build router")?);

    match &config.amm.pool_seed_path {
        Some(seed_path) if seed_path.exists() => {
            match load_pool_seed(seed_path, SystemClock.now_ns()) {
                Ok(pools) => match router.pools().initialize_from_seed(pools) {
                    Ok(count) => log_success!("Loaded {} pools into pool registry", count),
                    Err(e) => warn!("Failed to register seeded pools: {}", e),
                },
                Err(e) => {
                    warn!("Failed to load pool seed: {:#}", e);
                    info!("Starting with empty pool registry");
                }
            }
        }
        Some(seed_path) => {
            info!("No pool seed found at {:?}, starting with empty pool registry", seed_path);
        }
        None => info!("No pool seed configured, starting with empty pool registry"),
    }

    // Expiry bookkeeping and eviction of closed orders
    let sweeper = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(router.sweep_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = router.sweep().await {
                    log_error!("Order sweep failed: {}", e);
                }
            }
        })
    };

    log_success!("Smart Order Router initialized");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    sweeper.abort();
    router.log_stats();
    Ok(())
}

/// `SOR_CONFIG` names a config file (layered with `SOR_ENV`); otherwise
/// defaults plus explicit environment overrides
fn resolve_config() -> Result<RouterConfig> {
    match std::env::var(env::CONFIG_PATH) {
        Ok(path) => {
            let environment = std::env::var(env::ENVIRONMENT).ok();
            let path = PathBuf::from(path);
            load_config(Some(path.as_path()), environment.as_deref())
        }
        Err(_) => {
            let mut config = RouterConfig::from_env();
            config.expand_env_vars()?;
            config.validate()?;
            Ok(config)
        }
    }
}
