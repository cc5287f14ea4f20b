//! Standardized emoji logging for router modules
//!
//! Provides consistent emoji usage across router components to keep
//! service-level events easy to scan.

/// Standard emoji set for router logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅"; // Operation succeeded
    pub const ERROR: &'static str = "❌"; // Operation failed
    pub const WARNING: &'static str = "⚠️"; // Warning or caution

    // Module-specific
    pub const ROUTE: &'static str = "🧭"; // Route chosen
    pub const BOOK: &'static str = "📒"; // Order book / order lifecycle
    pub const POOL: &'static str = "🏊"; // AMM pool updates
    pub const CHART: &'static str = "📊"; // Data/statistics/metrics
    pub const EXECUTE: &'static str = "⚡"; // Execution hand-off
    pub const START: &'static str = "🚀"; // Service startup
}

// Convenience macros for standardized logging
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::WARNING, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_route {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::ROUTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_order {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::BOOK, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_pool {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::POOL, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}

/// Install the global subscriber: `RUST_LOG` if set, else the configured level
pub fn init_tracing(config: &config::LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json {
        subscriber.with(fmt::layer().json().with_current_span(false)).init();
    } else {
        subscriber.with(fmt::layer().with_target(true)).init();
    }
}
