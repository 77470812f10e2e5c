//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use vocastory_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// The instant most tests start from: 2026-01-15 10:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Never; the literal date is valid.
    #[must_use]
    pub fn at_default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    /// Returns a clock advanced by `by`.
    #[must_use]
    pub fn advanced(self, by: Duration) -> Self {
        Self(self.0 + by)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
