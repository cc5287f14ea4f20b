//! Service defaults
//!
//! Default values shared by the configuration structs and the services that
//! fall back to them.

/// Route selection defaults
pub mod routing {
    /// Upper bound on one venue query before it counts as failed (milliseconds)
    pub const DEFAULT_VENUE_TIMEOUT_MS: u64 = 250;

    /// How long a quote stays executable after it is produced (milliseconds)
    pub const DEFAULT_QUOTE_VALIDITY_MS: u64 = 30_000;

    /// Hard cap on requested snapshot depth
    pub const MAX_SNAPSHOT_DEPTH: usize = 500;
}

/// Order book defaults
pub mod order_book {
    /// Taker fee charged on order book fills (0.25%)
    pub const DEFAULT_TAKER_FEE_BPS: u32 = 25;

    /// Period of the expiry and eviction sweep (milliseconds)
    pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

    /// How long a closed order stays queryable before eviction (milliseconds)
    pub const DEFAULT_CLOSED_ORDER_RETENTION_MS: u64 = 300_000;
}

/// Gas model defaults
pub mod gas {
    /// Single constant-product pool swap
    pub const AMM_SWAP: u64 = 150_000;

    /// Order book settlement overhead independent of levels walked
    pub const ORDER_BOOK_BASE: u64 = 120_000;

    /// Additional gas per price level consumed
    pub const ORDER_BOOK_PER_LEVEL: u64 = 25_000;
}

/// Environment variable names read by the service binary
pub mod env {
    pub const CONFIG_PATH: &str = "SOR_CONFIG";
    pub const ENVIRONMENT: &str = "SOR_ENV";
    pub const VENUE_TIMEOUT_MS: &str = "SOR_VENUE_TIMEOUT_MS";
    pub const DEFAULT_TAKER_FEE_BPS: &str = "SOR_DEFAULT_TAKER_FEE_BPS";
    pub const SWEEP_INTERVAL_MS: &str = "SOR_SWEEP_INTERVAL_MS";
    pub const POOL_SEED_PATH: &str = "SOR_POOL_SEED_PATH";
    pub const LOG_LEVEL: &str = "SOR_LOG_LEVEL";
    pub const LOG_JSON: &str = "SOR_LOG_JSON";
}
