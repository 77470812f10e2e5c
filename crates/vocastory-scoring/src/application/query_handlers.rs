//! Query handlers for the Scoring context.
//!
//! Each query loads the current word sets and stories, flattens them into
//! rows, and runs the pure engine over them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::repository::EventRepository;
use vocastory_story::application::query_handlers::load_all_stories;
use vocastory_vocabulary::application::query_handlers::load_all_word_sets;

use crate::domain::engine::{self, StoryScore, UserScore};
use crate::domain::rows::{ContributionRow, ReviewRow, StoryRow};
use crate::domain::timeline::{TimelinePoint, cumulative_timeline};

/// Everything the engine needs, read from the streams.
#[derive(Debug, Default)]
struct Snapshot {
    /// Every participant with the time of the first event naming them.
    first_seen: BTreeMap<Uuid, DateTime<Utc>>,
    contributions: Vec<ContributionRow>,
    reviews: Vec<ReviewRow>,
    stories: Vec<StoryRow>,
}

impl Snapshot {
    fn note_participants(&mut self, participants: &BTreeMap<Uuid, DateTime<Utc>>) {
        for (user_id, at) in participants {
            self.first_seen
                .entry(*user_id)
                .and_modify(|seen| *seen = (*seen).min(*at))
                .or_insert(*at);
        }
    }

    fn users(&self) -> BTreeSet<Uuid> {
        self.first_seen.keys().copied().collect()
    }
}

async fn load_snapshot(repo: &dyn EventRepository) -> Result<Snapshot, DomainError> {
    let mut snapshot = Snapshot::default();

    for word_set in load_all_word_sets(repo).await? {
        snapshot.note_participants(word_set.participants());
    }

    for story in load_all_stories(repo).await? {
        snapshot.note_participants(story.participants());
        for c in story.contributions() {
            snapshot.contributions.push(ContributionRow {
                contribution_id: c.id,
                story_id: story.id,
                author_id: c.author_id,
                selected: c.selected,
                voters: c.voters.iter().copied().collect(),
                submitted_at: c.submitted_at,
            });
        }
        for review in story.reviews().values() {
            snapshot.reviews.push(ReviewRow {
                story_id: story.id,
                reviewer_id: review.reviewer_id,
                coherence: review.coherence,
                creativity: review.creativity,
                fun: review.fun,
                comment: review.comment.clone(),
            });
        }
        snapshot.stories.push(StoryRow {
            story_id: story.id,
            title: story.title().to_owned(),
            completed: story.is_completed(),
        });
    }

    debug!(
        users = snapshot.first_seen.len(),
        contributions = snapshot.contributions.len(),
        stories = snapshot.stories.len(),
        "scoring snapshot loaded"
    );
    Ok(snapshot)
}

/// Ranks every known participant by score.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_leaderboard(repo: &dyn EventRepository) -> Result<Vec<UserScore>, DomainError> {
    let snapshot = load_snapshot(repo).await?;
    Ok(engine::leaderboard(&snapshot.users(), &snapshot.contributions))
}

/// Returns the score of one user; unknown users score zero.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_user_score(
    user_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<UserScore, DomainError> {
    let snapshot = load_snapshot(repo).await?;
    Ok(engine::user_scores(&snapshot.contributions)
        .remove(&user_id)
        .unwrap_or_else(|| UserScore::zero(user_id)))
}

/// Ranks completed, reviewed stories by quality, keeping at most `limit`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_top_stories(
    limit: Option<usize>,
    repo: &dyn EventRepository,
) -> Result<Vec<StoryScore>, DomainError> {
    let snapshot = load_snapshot(repo).await?;
    let mut ranked = engine::top_stories(&snapshot.stories, &snapshot.reviews);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}

/// Cumulative count of submitted contributions per `bucket`, up to the end
/// of today.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a non-positive bucket and
/// `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_contribution_timeline(
    bucket: Duration,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<TimelinePoint>, DomainError> {
    let snapshot = load_snapshot(repo).await?;
    let instants: Vec<_> = snapshot
        .contributions
        .iter()
        .map(|c| c.submitted_at)
        .collect();
    cumulative_timeline(&instants, bucket, clock.now())
}

/// Cumulative count of known users per `bucket`. A user counts from the
/// first event that names them as creator, author, voter, reviewer or
/// starrer.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a non-positive bucket and
/// `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_user_timeline(
    bucket: Duration,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<TimelinePoint>, DomainError> {
    let snapshot = load_snapshot(repo).await?;
    let instants: Vec<_> = snapshot.first_seen.values().copied().collect();
    cumulative_timeline(&instants, bucket, clock.now())
}
