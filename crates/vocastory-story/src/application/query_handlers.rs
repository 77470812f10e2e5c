//! Query handlers for the Story Rounds context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use vocastory_core::error::DomainError;
use vocastory_core::repository::EventRepository;
use vocastory_vocabulary::application::command_handlers::load_word_set;
use vocastory_vocabulary::domain::word::Word;

use crate::application::command_handlers::{load_story, reconstitute};
use crate::domain::aggregates::Story;
use crate::domain::events::STORY_STARTED_EVENT_TYPE;

/// Number of trailing sentences shown to writers as context.
const CONTEXT_SENTENCES: usize = 2;

/// Candidate and vote counts of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    /// The round index.
    pub round_index: u32,
    /// Number of candidates submitted to the round.
    pub candidates: usize,
    /// Votes cast across those candidates.
    pub votes: usize,
    /// The winning contribution, once the round closed.
    pub selected_contribution_id: Option<Uuid>,
}

/// Read-only view of a story.
#[derive(Debug, Serialize)]
pub struct StoryView {
    /// The story identifier.
    pub story_id: Uuid,
    /// The word set the story is written against.
    pub word_set_id: Option<Uuid>,
    /// Display title.
    pub title: String,
    /// Whether every word has been used.
    pub completed: bool,
    /// The round accepting candidates.
    pub current_round: u32,
    /// Selected stylized sentences joined in round order.
    pub text: String,
    /// The last selected sentences, oldest first.
    pub last_sentences: Vec<String>,
    /// Words used by selected sentences.
    pub used_words: Vec<Word>,
    /// Words still to be used.
    pub unused_words: Vec<Word>,
    /// Per-round activity.
    pub rounds: Vec<RoundSummary>,
    /// Number of users who starred the story.
    pub star_count: usize,
    /// Number of reviews.
    pub review_count: usize,
    /// Start time.
    pub created_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

/// A current-round candidate as offered to a voter.
#[derive(Debug, Serialize)]
pub struct CandidateView {
    /// The contribution identifier.
    pub contribution_id: Uuid,
    /// The round it competes in.
    pub round_index: u32,
    /// Stylized text.
    pub stylized_text: String,
    /// Whether the requesting user already voted for it.
    pub voted: bool,
}

/// What a user may currently do with a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoryEligibility {
    /// The story identifier.
    pub story_id: Uuid,
    /// Has a candidate left to vote on.
    pub readable: bool,
    /// May submit to the current round.
    pub writable: bool,
    /// May review the completed story.
    pub reviewable: bool,
}

/// Listing row for a story.
#[derive(Debug, Serialize)]
pub struct StorySummary {
    /// The story identifier.
    pub story_id: Uuid,
    /// The word set.
    pub word_set_id: Option<Uuid>,
    /// Display title.
    pub title: String,
    /// Whether the story is complete.
    pub completed: bool,
    /// The round accepting candidates.
    pub current_round: u32,
    /// Number of users who starred the story.
    pub star_count: usize,
}

fn round_summaries(story: &Story) -> Vec<RoundSummary> {
    let mut rounds: BTreeMap<u32, RoundSummary> = BTreeMap::new();
    for c in story.contributions() {
        let summary = rounds.entry(c.round_index).or_insert(RoundSummary {
            round_index: c.round_index,
            candidates: 0,
            votes: 0,
            selected_contribution_id: None,
        });
        summary.candidates += 1;
        summary.votes += c.vote_count();
        if c.selected {
            summary.selected_contribution_id = Some(c.id);
        }
    }
    rounds.into_values().collect()
}

fn to_view(story: &Story) -> StoryView {
    let selected = story.selected_contributions();
    let sentences: Vec<String> = selected.iter().map(|c| c.stylized_text.clone()).collect();
    let used = story.used_word_ids();

    StoryView {
        story_id: story.id,
        word_set_id: story.word_set_id(),
        title: story.title().to_owned(),
        completed: story.is_completed(),
        current_round: story.current_round(),
        text: sentences.join(" "),
        last_sentences: sentences[sentences.len().saturating_sub(CONTEXT_SENTENCES)..].to_vec(),
        used_words: story
            .vocabulary()
            .iter()
            .filter(|w| used.contains(&w.id))
            .cloned()
            .collect(),
        unused_words: story.unused_words().into_iter().cloned().collect(),
        rounds: round_summaries(story),
        star_count: story.starred_by().len(),
        review_count: story.reviews().len(),
        created_at: story.created_at(),
        version: story.version,
    }
}

fn to_summary(story: &Story) -> StorySummary {
    StorySummary {
        story_id: story.id,
        word_set_id: story.word_set_id(),
        title: story.title().to_owned(),
        completed: story.is_completed(),
        current_round: story.current_round(),
        star_count: story.starred_by().len(),
    }
}

/// Loads every live story in start order. Discarded stories are skipped.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn load_all_stories(repo: &dyn EventRepository) -> Result<Vec<Story>, DomainError> {
    let ids = repo.list_aggregate_ids(STORY_STARTED_EVENT_TYPE).await?;
    let mut stories = Vec::with_capacity(ids.len());
    for id in ids {
        let events = repo.load_events(id).await?;
        let story = reconstitute(id, &events)?;
        if story.exists() {
            stories.push(story);
        }
    }
    Ok(stories)
}

/// Retrieves a story by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the story does not exist.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_story_by_id(
    story_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<StoryView, DomainError> {
    let story = load_story(story_id, repo).await?;
    Ok(to_view(&story))
}

/// Lists the current-round candidates offered to `user_id`: everything
/// except the user's own contributions.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the story does not exist.
pub async fn list_candidates(
    story_id: Uuid,
    user_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<CandidateView>, DomainError> {
    let story = load_story(story_id, repo).await?;
    if story.is_completed() {
        return Ok(Vec::new());
    }
    Ok(story
        .candidates()
        .filter(|c| c.author_id != user_id)
        .map(|c| CandidateView {
            contribution_id: c.id,
            round_index: c.round_index,
            stylized_text: c.stylized_text.clone(),
            voted: c.voters.contains(&user_id),
        })
        .collect())
}

/// Evaluates what `user_id` may do with a story.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the story does not exist.
pub async fn get_story_eligibility(
    story_id: Uuid,
    user_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<StoryEligibility, DomainError> {
    let story = load_story(story_id, repo).await?;
    Ok(StoryEligibility {
        story_id,
        readable: story.is_readable(user_id),
        writable: story.is_writable(user_id),
        reviewable: story.is_reviewable(user_id),
    })
}

/// Lists stories `user_id` has submitted to.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_stories_by_author(
    user_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<StorySummary>, DomainError> {
    Ok(load_all_stories(repo)
        .await?
        .iter()
        .filter(|s| s.contributions().iter().any(|c| c.author_id == user_id))
        .map(to_summary)
        .collect())
}

/// Lists the live stories of a word set.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the word set does not exist.
pub async fn list_stories_by_word_set(
    word_set_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<StorySummary>, DomainError> {
    load_word_set(word_set_id, repo).await?;
    Ok(load_all_stories(repo)
        .await?
        .iter()
        .filter(|s| s.word_set_id() == Some(word_set_id))
        .map(to_summary)
        .collect())
}
