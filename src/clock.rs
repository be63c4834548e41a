//! Wall-clock source for shared-tier timestamps and expiry checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of Unix timestamps (seconds).
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_secs(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually advanced [`Clock`]; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_secs: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_secs)),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::AcqRel);
    }

    pub fn set(&self, secs: i64) {
        self.now.store(secs, Ordering::Release);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }
}
