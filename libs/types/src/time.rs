//! Time sources
//!
//! All timestamps are nanoseconds since the UNIX epoch as `u64`. Components
//! take an `Arc<dyn Clock>` so deadline and expiry behavior can be driven
//! deterministically in tests with [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> u64 {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        duration_to_ns(duration)
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualClock {
    current_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            current_ns: AtomicU64::new(start_ns),
        }
    }

    pub fn set(&self, now_ns: u64) {
        self.current_ns.store(now_ns, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.current_ns.fetch_add(duration_to_ns(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.current_ns.load(Ordering::SeqCst)
    }
}

/// Saturates at `u64::MAX` (year 2554)
pub fn duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
