//! Time source for the engine
//!
//! All timestamping and staleness arithmetic goes through the `Clock` trait
//! so tests can drive time deterministically. Production code uses
//! `SystemClock`; tests use `ManualClock` and advance it explicitly.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Injectable time source.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests.
///
/// Starts at a fixed instant and only moves when told to.
///
/// # Example
/// ```
/// use dispatch_core::core::clock::{Clock, ManualClock};
/// use chrono::Duration;
///
/// let clock = ManualClock::default();
/// let t0 = clock.now();
/// clock.advance(Duration::minutes(45));
/// assert_eq!(clock.now() - t0, Duration::minutes(45));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock pinned to the given instant.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }

    /// Pin the clock to an exact instant.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("clock lock");
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // Arbitrary fixed epoch so tests are reproducible.
        let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Self::starting_at(base)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
