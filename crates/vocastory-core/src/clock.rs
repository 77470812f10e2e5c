//! Clock abstraction for determinism.
//!
//! Round closing compares stored submission timestamps against "now", so
//! every time-dependent decision goes through this trait.

use chrono::{DateTime, Duration, Utc};

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Time elapsed since `instant`. Negative when `instant` lies in the future.
    fn elapsed_since(&self, instant: DateTime<Utc>) -> Duration {
        self.now() - instant
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
