//! Round closing policy.

use chrono::Duration;

/// Thresholds that decide when the current round of a story closes.
///
/// A round closes when its leading candidate satisfies any of:
/// the time since the latest submission exceeds `long_timeout`; its vote
/// count exceeds `high_votes`; or the time exceeds `short_timeout` while
/// its vote count exceeds `low_votes`. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingPolicy {
    /// `T_long`: close regardless of votes after this long.
    pub long_timeout: Duration,
    /// `T_short`: close with a modest lead after this long.
    pub short_timeout: Duration,
    /// `V_high`: close immediately above this many votes.
    pub high_votes: usize,
    /// `V_low`: votes needed once `short_timeout` has passed.
    pub low_votes: usize,
}

impl Default for ClosingPolicy {
    fn default() -> Self {
        Self {
            long_timeout: Duration::hours(24),
            short_timeout: Duration::hours(1),
            high_votes: 5,
            low_votes: 2,
        }
    }
}

impl ClosingPolicy {
    /// Whether a round whose latest submission is `elapsed` old and whose
    /// leading candidate holds `top_votes` votes should close.
    #[must_use]
    pub fn should_close(&self, elapsed: Duration, top_votes: usize) -> bool {
        elapsed > self.long_timeout
            || top_votes > self.high_votes
            || (elapsed > self.short_timeout && top_votes > self.low_votes)
    }
}
