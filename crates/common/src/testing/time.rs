//! Controllable clock for expiry tests
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use minihome_common::clock::Clock;
//! use minihome_common::testing::MockClock;
//!
//! let clock = MockClock::at(1_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.millis_since_epoch(), 6_000);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::clock::Clock;

/// Mock clock for deterministic testing
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    millis: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a mock clock at 2023-11-14T22:13:20Z.
    #[must_use]
    pub fn new() -> Self {
        Self::at(1_700_000_000_000)
    }

    /// Create a mock clock at `millis` since the UNIX epoch.
    #[must_use]
    pub fn at(millis: u64) -> Self {
        Self { millis: Arc::new(AtomicU64::new(millis)) }
    }

    /// Advance the mock clock by a duration
    ///
    /// This simulates time passing without actually waiting.
    pub fn advance(&self, duration: Duration) {
        let delta = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    /// Jump to an absolute time in epoch milliseconds.
    pub fn set_millis(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }

    fn millis_since_epoch(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
