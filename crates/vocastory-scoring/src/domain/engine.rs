//! Scoring formulas.
//!
//! A user earns [`POINTS_PER_SELECTED_AUTHORED`] for every selected sentence
//! they wrote and [`POINTS_PER_SELECTED_VOTE`] for every selected sentence
//! they voted for. A completed story's quality is the sum of its average
//! ratings plus one point per review with a substantive comment.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use uuid::Uuid;

use super::rows::{ContributionRow, ReviewRow, StoryRow};

/// Points for authoring a selected contribution.
pub const POINTS_PER_SELECTED_AUTHORED: u64 = 10;
/// Points for voting for a contribution that went on to be selected.
pub const POINTS_PER_SELECTED_VOTE: u64 = 2;
/// Minimum comment length, in characters, for a review to earn a point.
pub const MIN_SUBSTANTIVE_COMMENT_CHARS: usize = 5;

/// A leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserScore {
    /// The user.
    pub user_id: Uuid,
    /// Total points.
    pub score: u64,
    /// Selected contributions authored.
    pub selected_authored: u64,
    /// Selected contributions voted for.
    pub selected_voted: u64,
}

impl UserScore {
    /// A row for a user without points.
    #[must_use]
    pub fn zero(user_id: Uuid) -> Self {
        Self {
            user_id,
            score: 0,
            selected_authored: 0,
            selected_voted: 0,
        }
    }
}

/// A top-stories row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryScore {
    /// The story.
    pub story_id: Uuid,
    /// Display title.
    pub title: String,
    /// Quality score.
    pub score: f64,
    /// Number of reviews behind the score.
    pub review_count: usize,
}

/// Computes the score of every user who authored or voted for a selected
/// contribution.
#[must_use]
pub fn user_scores(contributions: &[ContributionRow]) -> BTreeMap<Uuid, UserScore> {
    let mut scores: BTreeMap<Uuid, UserScore> = BTreeMap::new();
    let mut seen = BTreeSet::new();

    for row in contributions.iter().filter(|c| c.selected) {
        if !seen.insert(row.contribution_id) {
            continue;
        }
        let author = scores
            .entry(row.author_id)
            .or_insert_with(|| UserScore::zero(row.author_id));
        author.selected_authored += 1;
        author.score += POINTS_PER_SELECTED_AUTHORED;

        let voters: BTreeSet<Uuid> = row.voters.iter().copied().collect();
        for voter in voters {
            let entry = scores
                .entry(voter)
                .or_insert_with(|| UserScore::zero(voter));
            entry.selected_voted += 1;
            entry.score += POINTS_PER_SELECTED_VOTE;
        }
    }
    scores
}

/// Ranks `users` by descending score; ties go to the lower user id.
/// Users without points are listed with a zero score.
#[must_use]
pub fn leaderboard(users: &BTreeSet<Uuid>, contributions: &[ContributionRow]) -> Vec<UserScore> {
    let scores = user_scores(contributions);
    let mut rows: Vec<UserScore> = users
        .iter()
        .chain(scores.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|id| {
            scores
                .get(id)
                .cloned()
                .unwrap_or_else(|| UserScore::zero(*id))
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then(a.user_id.cmp(&b.user_id)));
    rows
}

/// Quality score of a story from its reviews; `None` without reviews.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn story_quality(reviews: &[&ReviewRow]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let n = reviews.len() as f64;
    let average = |rating: fn(&ReviewRow) -> u8| {
        reviews.iter().map(|r| f64::from(rating(r))).sum::<f64>() / n
    };
    let substantive = reviews
        .iter()
        .filter(|r| r.comment.chars().count() >= MIN_SUBSTANTIVE_COMMENT_CHARS)
        .count();

    Some(
        average(|r| r.coherence)
            + average(|r| r.creativity)
            + average(|r| r.fun)
            + substantive as f64,
    )
}

/// Ranks completed, reviewed stories by descending quality; ties go to the
/// lower story id.
#[must_use]
pub fn top_stories(stories: &[StoryRow], reviews: &[ReviewRow]) -> Vec<StoryScore> {
    let mut by_story: BTreeMap<Uuid, Vec<&ReviewRow>> = BTreeMap::new();
    for review in reviews {
        by_story.entry(review.story_id).or_default().push(review);
    }

    let mut ranked: Vec<StoryScore> = stories
        .iter()
        .filter(|s| s.completed)
        .filter_map(|s| {
            let story_reviews = by_story.get(&s.story_id)?;
            story_quality(story_reviews).map(|score| StoryScore {
                story_id: s.story_id,
                title: s.title.clone(),
                score,
                review_count: story_reviews.len(),
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.story_id.cmp(&b.story_id))
    });
    ranked
}
