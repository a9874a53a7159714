//! Wall-clock abstraction
//!
//! Token expiry is compared against epoch milliseconds. Going through a
//! trait lets tests pin and advance time without sleeping.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current system time.
    fn system_time(&self) -> SystemTime;

    /// Milliseconds since the UNIX epoch.
    ///
    /// Times before the epoch read as zero.
    fn millis_since_epoch(&self) -> u64 {
        let elapsed = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }

    fn millis_since_epoch(&self) -> u64 {
        (**self).millis_since_epoch()
    }
}
