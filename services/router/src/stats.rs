//! Router counters

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use types::Route;

#[derive(Debug, Default)]
pub struct RouterStats {
    quotes_order_book: AtomicU64,
    quotes_amm: AtomicU64,
    quote_failures: AtomicU64,
    orders_created: AtomicU64,
    orders_cancelled: AtomicU64,
    orders_filled: AtomicU64,
    orders_expired: AtomicU64,
    orders_evicted: AtomicU64,
    swaps_executed: AtomicU64,
    persistence_failures: AtomicU64,
    quoted_volume_in: Mutex<u128>,
}

/// Point-in-time copy of [`RouterStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub quotes_order_book: u64,
    pub quotes_amm: u64,
    pub quote_failures: u64,
    pub orders_created: u64,
    pub orders_cancelled: u64,
    pub orders_filled: u64,
    pub orders_expired: u64,
    pub orders_evicted: u64,
    pub swaps_executed: u64,
    pub persistence_failures: u64,
    pub quoted_volume_in: u128,
}

impl StatsSnapshot {
    pub fn quotes_served(&self) -> u64 {
        self.quotes_order_book + self.quotes_amm
    }
}

impl RouterStats {
    pub fn record_quote(&self, route: Route, amount_in: u128) {
        match route {
            Route::OrderBook => self.quotes_order_book.fetch_add(1, Ordering::Relaxed),
            Route::Amm => self.quotes_amm.fetch_add(1, Ordering::Relaxed),
        };
        let mut volume = self.quoted_volume_in.lock();
        *volume = volume.saturating_add(amount_in);
    }

    pub fn record_quote_failure(&self) {
        self.quote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_created(&self) {
        self.orders_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_filled(&self) {
        self.orders_filled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_orders_expired(&self, count: usize) {
        self.orders_expired
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub fn record_orders_evicted(&self, count: usize) {
        self.orders_evicted
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub fn record_swap_executed(&self) {
        self.swaps_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            quotes_order_book: self.quotes_order_book.load(Ordering::Relaxed),
            quotes_amm: self.quotes_amm.load(Ordering::Relaxed),
            quote_failures: self.quote_failures.load(Ordering::Relaxed),
            orders_created: self.orders_created.load(Ordering::Relaxed),
            orders_cancelled: self.orders_cancelled.load(Ordering::Relaxed),
            orders_filled: self.orders_filled.load(Ordering::Relaxed),
            orders_expired: self.orders_expired.load(Ordering::Relaxed),
            orders_evicted: self.orders_evicted.load(Ordering::Relaxed),
            swaps_executed: self.swaps_executed.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            quoted_volume_in: *self.quoted_volume_in.lock(),
        }
    }
}
