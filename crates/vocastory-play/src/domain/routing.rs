//! The routing decision.
//!
//! Each attempt draws a mode from the configured weights, filters the pool
//! by that mode's eligibility predicate, and picks one story uniformly. A
//! write draw with nothing writable asks for a new story instead. Every
//! random choice goes through [`DeterministicRng`], so a scripted RNG
//! replays the same route.

use serde::Serialize;
use uuid::Uuid;
use vocastory_core::error::DomainError;
use vocastory_core::rng::DeterministicRng;
use vocastory_story::domain::aggregates::Story;

/// Default weight of the read mode.
pub const DEFAULT_READ_WEIGHT: f64 = 0.45;
/// Default weight of the write mode.
pub const DEFAULT_WRITE_WEIGHT: f64 = 0.45;
/// Default weight of the review mode.
pub const DEFAULT_REVIEW_WEIGHT: f64 = 0.10;
/// Default number of draws before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 25;

/// What the participant does with the story they are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Vote on current-round candidates.
    Read,
    /// Submit a sentence to the current round.
    Write,
    /// Rate a completed story.
    Review,
}

/// Mode weights and the attempt bound.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    /// Relative weight of [`PlayMode::Read`].
    pub read_weight: f64,
    /// Relative weight of [`PlayMode::Write`].
    pub write_weight: f64,
    /// Relative weight of [`PlayMode::Review`].
    pub review_weight: f64,
    /// Draws before returning [`RouteDecision::NothingAvailable`].
    pub max_attempts: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            read_weight: DEFAULT_READ_WEIGHT,
            write_weight: DEFAULT_WRITE_WEIGHT,
            review_weight: DEFAULT_REVIEW_WEIGHT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RoutingConfig {
    /// Checks that the weights are usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a weight is negative or not
    /// finite, or if the weights sum to zero.
    pub fn validate(&self) -> Result<(), DomainError> {
        let weights = [self.read_weight, self.write_weight, self.review_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DomainError::Validation(
                "play weights must be finite and non-negative".to_owned(),
            ));
        }
        if self.total_weight() <= 0.0 {
            return Err(DomainError::Validation(
                "play weights must not all be zero".to_owned(),
            ));
        }
        Ok(())
    }

    fn total_weight(&self) -> f64 {
        self.read_weight + self.write_weight + self.review_weight
    }

    /// Maps a draw in `[0, 1)` onto a mode.
    fn mode_for(&self, draw: f64) -> PlayMode {
        let point = draw * self.total_weight();
        if point < self.read_weight {
            PlayMode::Read
        } else if point < self.read_weight + self.write_weight {
            PlayMode::Write
        } else {
            PlayMode::Review
        }
    }
}

/// Where to send the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Act on an existing story.
    Story {
        /// The chosen mode.
        mode: PlayMode,
        /// The chosen story.
        story_id: Uuid,
    },
    /// Nothing was writable; start a story over this word set and write.
    CreateStory {
        /// The word set to start the story from.
        word_set_id: Uuid,
    },
    /// Every attempt came up empty.
    NothingAvailable,
}

fn is_eligible(story: &Story, mode: PlayMode, user_id: Uuid) -> bool {
    match mode {
        PlayMode::Read => story.is_readable(user_id),
        PlayMode::Write => story.is_writable(user_id),
        PlayMode::Review => story.is_reviewable(user_id),
    }
}

/// Decides where `user_id` goes next.
///
/// `stories` are the stories of the pool and `word_set_ids` the live word
/// sets a new story may be started from.
#[must_use]
pub fn plan_route(
    user_id: Uuid,
    stories: &[Story],
    word_set_ids: &[Uuid],
    config: &RoutingConfig,
    rng: &mut dyn DeterministicRng,
) -> RouteDecision {
    for _ in 0..config.max_attempts {
        let mode = config.mode_for(rng.next_f64());
        let eligible: Vec<&Story> = stories
            .iter()
            .filter(|s| is_eligible(s, mode, user_id))
            .collect();

        if let Some(index) = rng.pick_index(eligible.len()) {
            return RouteDecision::Story {
                mode,
                story_id: eligible[index].id,
            };
        }
        if mode == PlayMode::Write {
            if let Some(index) = rng.pick_index(word_set_ids.len()) {
                return RouteDecision::CreateStory {
                    word_set_id: word_set_ids[index],
                };
            }
        }
    }
    RouteDecision::NothingAvailable
}
