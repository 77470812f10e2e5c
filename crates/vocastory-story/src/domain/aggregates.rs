//! Aggregate roots for the Story Rounds context.
//!
//! A `Story` owns its whole round state: candidates, votes, selections,
//! reviews, and stars. Everything one command decides is raised as events on
//! the same stream and persisted in a single append, which is what keeps a
//! round from ever being selected twice.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use vocastory_core::aggregate::AggregateRoot;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::event::EventMetadata;
use vocastory_vocabulary::domain::word::Word;

use super::events::{
    ContributionSelected, ContributionSubmitted, StoryCompleted, StoryDiscarded, StoryEvent,
    StoryEventKind, StoryReviewed, StoryStarred, StoryStarted, StoryUnstarred, VoteCast,
};
use super::policy::ClosingPolicy;
use super::validator::ContributionValidator;

/// Maximum length of a story title, in characters.
pub const MAX_STORY_TITLE_LEN: usize = 100;
/// Maximum length of a review comment, in characters.
pub const MAX_REVIEW_COMMENT_LEN: usize = 250;
/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 10;

/// A candidate sentence submitted to a round.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    /// Contribution identifier.
    pub id: Uuid,
    /// The submitting user.
    pub author_id: Uuid,
    /// The round this contribution competes in.
    pub round_index: u32,
    /// Normalized text.
    pub text: String,
    /// Text with vocabulary links.
    pub stylized_text: String,
    /// Vocabulary words used.
    pub matched_word_ids: Vec<Uuid>,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Whether this contribution won its round.
    pub selected: bool,
    /// Users who voted for it.
    pub voters: BTreeSet<Uuid>,
}

impl Contribution {
    /// Number of distinct voters.
    #[must_use]
    pub fn vote_count(&self) -> usize {
        self.voters.len()
    }
}

/// A user's review of a completed story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    /// The reviewing user.
    pub reviewer_id: Uuid,
    /// Whether the story was reported.
    pub flag: bool,
    /// Coherence rating.
    pub coherence: u8,
    /// Creativity rating.
    pub creativity: u8,
    /// Fun rating.
    pub fun: u8,
    /// Free-text comment.
    pub comment: String,
    /// Time of the latest edit.
    pub reviewed_at: DateTime<Utc>,
}

/// Review input, validated by [`Story::review`]. Ratings arrive unchecked
/// and are narrowed once they pass the range check.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    /// Report flag.
    pub flag: bool,
    /// Coherence rating.
    pub coherence: i64,
    /// Creativity rating.
    pub creativity: i64,
    /// Fun rating.
    pub fun: i64,
    /// Free-text comment.
    pub comment: String,
}

fn checked_rating(name: &str, rating: i64) -> Result<u8, DomainError> {
    u8::try_from(rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "{name} rating must be between {MIN_RATING} and {MAX_RATING}"
            ))
        })
}

/// The aggregate root for a collaboratively written story.
#[derive(Debug)]
pub struct Story {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (stored event count).
    pub(crate) version: i64,
    pub(crate) word_set_id: Option<Uuid>,
    pub(crate) title: String,
    pub(crate) vocabulary: Vec<Word>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) completed: bool,
    pub(crate) discarded: bool,
    /// Contributions in submission order.
    pub(crate) contributions: Vec<Contribution>,
    pub(crate) reviews: BTreeMap<Uuid, Review>,
    pub(crate) starred_by: BTreeSet<Uuid>,
    /// When each user first appeared in this stream.
    pub(crate) participants: BTreeMap<Uuid, DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<StoryEvent>,
}

impl Story {
    /// Creates an empty story shell for reconstitution.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            word_set_id: None,
            title: String::new(),
            vocabulary: Vec::new(),
            created_at: None,
            completed: false,
            discarded: false,
            contributions: Vec::new(),
            reviews: BTreeMap::new(),
            starred_by: BTreeSet::new(),
            participants: BTreeMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// The word set this story is written against.
    #[must_use]
    pub fn word_set_id(&self) -> Option<Uuid> {
        self.word_set_id
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The vocabulary snapshot taken when the story started.
    #[must_use]
    pub fn vocabulary(&self) -> &[Word] {
        &self.vocabulary
    }

    /// Start time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Whether every vocabulary word has been used.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether the story was discarded with its word set.
    #[must_use]
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Whether the story has started and has not been discarded.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.created_at.is_some() && !self.discarded
    }

    /// All contributions in submission order.
    #[must_use]
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Reviews keyed by reviewer.
    #[must_use]
    pub fn reviews(&self) -> &BTreeMap<Uuid, Review> {
        &self.reviews
    }

    /// Users who starred this story.
    #[must_use]
    pub fn starred_by(&self) -> &BTreeSet<Uuid> {
        &self.starred_by
    }

    /// Every user named by this stream, with the time of their first event.
    #[must_use]
    pub fn participants(&self) -> &BTreeMap<Uuid, DateTime<Utc>> {
        &self.participants
    }

    /// The round currently accepting candidates and votes: one past the
    /// highest selected round, or 0 before any selection.
    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.contributions
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.round_index)
            .max()
            .map_or(0, |last| last + 1)
    }

    /// Candidates of the current round, in submission order.
    pub fn candidates(&self) -> impl Iterator<Item = &Contribution> {
        let round = self.current_round();
        self.contributions
            .iter()
            .filter(move |c| c.round_index == round)
    }

    /// Selected contributions in round order.
    #[must_use]
    pub fn selected_contributions(&self) -> Vec<&Contribution> {
        let mut selected: Vec<&Contribution> =
            self.contributions.iter().filter(|c| c.selected).collect();
        selected.sort_by_key(|c| c.round_index);
        selected
    }

    /// Identifiers of vocabulary words used by selected contributions.
    #[must_use]
    pub fn used_word_ids(&self) -> BTreeSet<Uuid> {
        self.contributions
            .iter()
            .filter(|c| c.selected)
            .flat_map(|c| c.matched_word_ids.iter().copied())
            .collect()
    }

    /// Vocabulary words not yet used by any selected contribution.
    #[must_use]
    pub fn unused_words(&self) -> Vec<&Word> {
        let used = self.used_word_ids();
        self.vocabulary
            .iter()
            .filter(|w| !used.contains(&w.id))
            .collect()
    }

    /// Whether `user_id` has a current-round candidate left to vote on.
    #[must_use]
    pub fn is_readable(&self, user_id: Uuid) -> bool {
        self.exists()
            && !self.completed
            && self
                .candidates()
                .any(|c| c.author_id != user_id && !c.voters.contains(&user_id))
    }

    /// Whether `user_id` may still submit to the current round.
    #[must_use]
    pub fn is_writable(&self, user_id: Uuid) -> bool {
        self.exists() && !self.completed && !self.candidates().any(|c| c.author_id == user_id)
    }

    /// Whether `user_id` may review the story.
    #[must_use]
    pub fn is_reviewable(&self, user_id: Uuid) -> bool {
        self.exists() && self.completed && !self.reviews.contains_key(&user_id)
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Records a new event: mutates state and queues it for persistence.
    fn raise(&mut self, kind: StoryEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let metadata = EventMetadata::new(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.mutate(&kind, metadata.occurred_at);
        self.uncommitted_events.push(StoryEvent { metadata, kind });
    }

    fn mutate(&mut self, kind: &StoryEventKind, occurred_at: DateTime<Utc>) {
        if let Some(user_id) = kind.user_id() {
            self.participants.entry(user_id).or_insert(occurred_at);
        }
        match kind {
            StoryEventKind::StoryStarted(payload) => {
                self.word_set_id = Some(payload.word_set_id);
                self.title.clone_from(&payload.title);
                self.vocabulary.clone_from(&payload.vocabulary);
                self.created_at = Some(occurred_at);
            }
            StoryEventKind::ContributionSubmitted(payload) => {
                self.contributions.push(Contribution {
                    id: payload.contribution_id,
                    author_id: payload.author_id,
                    round_index: payload.round_index,
                    text: payload.text.clone(),
                    stylized_text: payload.stylized_text.clone(),
                    matched_word_ids: payload.matched_word_ids.clone(),
                    submitted_at: occurred_at,
                    selected: false,
                    voters: BTreeSet::new(),
                });
            }
            StoryEventKind::VoteCast(payload) => {
                if let Some(c) = self.contribution_mut(payload.contribution_id) {
                    c.voters.insert(payload.voter_id);
                }
            }
            StoryEventKind::ContributionSelected(payload) => {
                if let Some(c) = self.contribution_mut(payload.contribution_id) {
                    c.selected = true;
                }
            }
            StoryEventKind::StoryCompleted(_) => {
                self.completed = true;
            }
            StoryEventKind::StoryReviewed(payload) => {
                self.reviews.insert(
                    payload.reviewer_id,
                    Review {
                        reviewer_id: payload.reviewer_id,
                        flag: payload.flag,
                        coherence: payload.coherence,
                        creativity: payload.creativity,
                        fun: payload.fun,
                        comment: payload.comment.clone(),
                        reviewed_at: occurred_at,
                    },
                );
            }
            StoryEventKind::StoryStarred(payload) => {
                self.starred_by.insert(payload.user_id);
            }
            StoryEventKind::StoryUnstarred(payload) => {
                self.starred_by.remove(&payload.user_id);
            }
            StoryEventKind::StoryDiscarded(_) => {
                self.discarded = true;
            }
        }
    }

    fn contribution_mut(&mut self, contribution_id: Uuid) -> Option<&mut Contribution> {
        self.contributions
            .iter_mut()
            .find(|c| c.id == contribution_id)
    }

    fn ensure_exists(&self) -> Result<(), DomainError> {
        if self.exists() {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        self.ensure_exists()?;
        if self.completed {
            return Err(DomainError::InvalidState(format!(
                "story {} is complete",
                self.id
            )));
        }
        Ok(())
    }

    /// Starts the story over a word set, snapshotting its vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the story already started, and
    /// `DomainError::Validation` if the title or vocabulary is invalid.
    pub fn start(
        &mut self,
        word_set_id: Uuid,
        title: &str,
        vocabulary: Vec<Word>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.created_at.is_some() {
            return Err(DomainError::InvalidState(format!(
                "story {} already started",
                self.id
            )));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation(
                "story title must not be empty".to_owned(),
            ));
        }
        if title.chars().count() > MAX_STORY_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "story title exceeds {MAX_STORY_TITLE_LEN} characters"
            )));
        }
        if vocabulary.is_empty() {
            return Err(DomainError::Validation(
                "story vocabulary must not be empty".to_owned(),
            ));
        }

        self.raise(
            StoryEventKind::StoryStarted(StoryStarted {
                story_id: self.id,
                word_set_id,
                title: title.to_owned(),
                vocabulary,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Submits a candidate sentence for `round_index`.
    ///
    /// Submissions for an already closed round are accepted into that round
    /// but can never be selected. Returns the new contribution's id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the story does not exist,
    /// `DomainError::InvalidState` if it is complete or `round_index` is
    /// ahead of the current round, and `DomainError::Validation` if the
    /// validator rejects the text.
    pub fn submit(
        &mut self,
        author_id: Uuid,
        round_index: u32,
        raw_text: &str,
        validator: &ContributionValidator,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Uuid, DomainError> {
        self.ensure_open()?;

        let current = self.current_round();
        if round_index > current {
            return Err(DomainError::InvalidState(format!(
                "round {round_index} has not opened yet; current round is {current}"
            )));
        }

        let accepted = validator.validate(raw_text, &self.vocabulary)?;
        let contribution_id = Uuid::new_v4();
        self.raise(
            StoryEventKind::ContributionSubmitted(ContributionSubmitted {
                story_id: self.id,
                contribution_id,
                author_id,
                round_index,
                text: accepted.text,
                stylized_text: accepted.stylized_text,
                matched_word_ids: accepted.matched_words.iter().map(|w| w.id).collect(),
            }),
            correlation_id,
            clock,
        );
        Ok(contribution_id)
    }

    /// Adds `voter_id` to the voters of a current-round candidate. Returns
    /// `false` without raising an event if the user already voted for it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the story does not exist,
    /// `DomainError::EntityNotFound` for an unknown contribution, and
    /// `DomainError::InvalidState` if the story is complete or the
    /// contribution is not in the current round.
    pub fn cast_vote(
        &mut self,
        voter_id: Uuid,
        contribution_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.ensure_open()?;

        let current = self.current_round();
        let contribution = self
            .contributions
            .iter()
            .find(|c| c.id == contribution_id)
            .ok_or(DomainError::EntityNotFound {
                entity: "contribution",
                id: contribution_id,
            })?;
        if contribution.round_index != current {
            return Err(DomainError::InvalidState(format!(
                "contribution {contribution_id} is not a candidate of round {current}"
            )));
        }
        if contribution.voters.contains(&voter_id) {
            return Ok(false);
        }

        self.raise(
            StoryEventKind::VoteCast(VoteCast {
                story_id: self.id,
                contribution_id,
                voter_id,
            }),
            correlation_id,
            clock,
        );
        Ok(true)
    }

    /// Closes the current round if `policy` says it is due, selecting the
    /// candidate with the most votes. Ties go to the earliest submission.
    /// Returns the selected contribution.
    pub fn close_poll_if_due(
        &mut self,
        policy: &ClosingPolicy,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Option<Uuid> {
        if !self.exists() || self.completed {
            return None;
        }

        let round_index = self.current_round();
        let mut candidates: Vec<&Contribution> = self.candidates().collect();
        let latest = candidates.iter().map(|c| c.submitted_at).max()?;
        candidates.sort_by_key(|c| Reverse(c.vote_count()));
        let top = candidates.first()?;

        let elapsed = clock.elapsed_since(latest);
        let votes = top.vote_count();
        if !policy.should_close(elapsed, votes) {
            debug!(story_id = %self.id, round_index, votes, "round stays open");
            return None;
        }

        let contribution_id = top.id;
        self.raise(
            StoryEventKind::ContributionSelected(ContributionSelected {
                story_id: self.id,
                contribution_id,
                round_index,
                votes,
            }),
            correlation_id,
            clock,
        );
        Some(contribution_id)
    }

    /// Completes the story once every vocabulary word has been used by a
    /// selected contribution. Returns whether this call completed it.
    pub fn finish_if_exhausted(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> bool {
        if !self.exists() || self.completed || !self.unused_words().is_empty() {
            return false;
        }

        self.raise(
            StoryEventKind::StoryCompleted(StoryCompleted { story_id: self.id }),
            correlation_id,
            clock,
        );
        true
    }

    /// Records or replaces the review of `reviewer_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the story does not exist,
    /// `DomainError::InvalidState` if it is not complete, and
    /// `DomainError::Validation` for out-of-range ratings or an overlong
    /// comment.
    pub fn review(
        &mut self,
        reviewer_id: Uuid,
        input: ReviewInput,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_exists()?;
        if !self.completed {
            return Err(DomainError::InvalidState(format!(
                "story {} is not complete yet",
                self.id
            )));
        }
        let coherence = checked_rating("coherence", input.coherence)?;
        let creativity = checked_rating("creativity", input.creativity)?;
        let fun = checked_rating("fun", input.fun)?;
        if input.comment.chars().count() > MAX_REVIEW_COMMENT_LEN {
            return Err(DomainError::Validation(format!(
                "review comment exceeds {MAX_REVIEW_COMMENT_LEN} characters"
            )));
        }

        self.raise(
            StoryEventKind::StoryReviewed(StoryReviewed {
                story_id: self.id,
                reviewer_id,
                flag: input.flag,
                coherence,
                creativity,
                fun,
                comment: input.comment,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Stars the story for `user_id`, or removes the star if present.
    /// Returns whether the story is starred by the user afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the story does not exist.
    pub fn toggle_star(
        &mut self,
        user_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.ensure_exists()?;

        let starred = self.starred_by.contains(&user_id);
        let kind = if starred {
            StoryEventKind::StoryUnstarred(StoryUnstarred {
                story_id: self.id,
                user_id,
            })
        } else {
            StoryEventKind::StoryStarred(StoryStarred {
                story_id: self.id,
                user_id,
            })
        };
        self.raise(kind, correlation_id, clock);
        Ok(!starred)
    }

    /// Discards the story after its word set was deleted. Returns `false`
    /// if it was already discarded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the story never started.
    pub fn discard(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        if self.discarded {
            return Ok(false);
        }
        let Some(word_set_id) = self.word_set_id else {
            return Err(DomainError::AggregateNotFound(self.id));
        };

        self.raise(
            StoryEventKind::StoryDiscarded(StoryDiscarded {
                story_id: self.id,
                word_set_id,
            }),
            correlation_id,
            clock,
        );
        Ok(true)
    }
}

impl AggregateRoot for Story {
    type Event = StoryEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.mutate(&event.kind, event.metadata.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use vocastory_core::event::DomainEvent;
    use vocastory_test_support::FixedClock;
    use vocastory_vocabulary::domain::word::parse_word_list;

    use super::*;
    use crate::domain::lemmatizer::RuleLemmatizer;

    fn validator() -> ContributionValidator {
        ContributionValidator::new(Arc::new(RuleLemmatizer::new()))
    }

    fn started_story(words: &[&str], clock: &FixedClock) -> Story {
        let mut story = Story::new(Uuid::new_v4());
        story
            .start(
                Uuid::new_v4(),
                "Tale",
                parse_word_list(words).unwrap(),
                Uuid::new_v4(),
                clock,
            )
            .unwrap();
        story
    }

    fn submit(story: &mut Story, author: Uuid, text: &str, clock: &FixedClock) -> Uuid {
        let round = story.current_round();
        story
            .submit(author, round, text, &validator(), Uuid::new_v4(), clock)
            .unwrap()
    }

    fn vote(story: &mut Story, contribution_id: Uuid, voters: usize, clock: &FixedClock) {
        for _ in 0..voters {
            story
                .cast_vote(Uuid::new_v4(), contribution_id, Uuid::new_v4(), clock)
                .unwrap();
        }
    }

    fn high_threshold(high_votes: usize) -> ClosingPolicy {
        ClosingPolicy {
            high_votes,
            ..ClosingPolicy::default()
        }
    }

    fn event_types(story: &Story) -> Vec<&'static str> {
        story
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect()
    }

    #[test]
    fn test_submit_records_matched_words_and_keeps_candidate_unselected() {
        // Arrange
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "run"], &clock);
        let author = Uuid::new_v4();

        // Act
        let contribution_id = story
            .submit(author, 0, "The cat ran.", &validator(), Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let contribution = &story.contributions()[0];
        assert_eq!(contribution.id, contribution_id);
        assert_eq!(contribution.author_id, author);
        assert_eq!(contribution.round_index, 0);
        assert_eq!(contribution.matched_word_ids.len(), 2);
        assert!(!contribution.selected);
        assert_eq!(contribution.submitted_at, clock.0);
        assert_eq!(
            event_types(&story),
            vec!["story.started", "story.contribution_submitted"]
        );
    }

    #[test]
    fn test_submit_without_vocabulary_raises_nothing() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "run"], &clock);

        let result = story.submit(
            Uuid::new_v4(),
            0,
            "Hello there",
            &validator(),
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(story.contributions().is_empty());
        assert_eq!(story.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_submit_to_unknown_story_returns_not_found() {
        let id = Uuid::new_v4();
        let mut story = Story::new(id);

        let result = story.submit(
            Uuid::new_v4(),
            0,
            "The cat ran.",
            &validator(),
            Uuid::new_v4(),
            &FixedClock::at_default(),
        );

        match result {
            Err(DomainError::AggregateNotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_for_future_round_returns_invalid_state() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);

        let result = story.submit(
            Uuid::new_v4(),
            1,
            "A cat.",
            &validator(),
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn test_submission_for_stale_round_is_kept_but_never_selected() {
        // Arrange
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog", "bird"], &clock);
        let winner = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        vote(&mut story, winner, 1, &clock);
        story.close_poll_if_due(&high_threshold(0), Uuid::new_v4(), &clock);
        assert_eq!(story.current_round(), 1);

        // Act
        let stale = story
            .submit(Uuid::new_v4(), 0, "A dog.", &validator(), Uuid::new_v4(), &clock)
            .unwrap();
        let fresh = submit(&mut story, Uuid::new_v4(), "A bird.", &clock);
        let stale_vote = story.cast_vote(Uuid::new_v4(), stale, Uuid::new_v4(), &clock);
        vote(&mut story, fresh, 1, &clock);
        let selected = story.close_poll_if_due(&high_threshold(0), Uuid::new_v4(), &clock);

        // Assert
        assert!(matches!(stale_vote, Err(DomainError::InvalidState(_))));
        assert_eq!(selected, Some(fresh));
        let stale_contribution = story.contributions().iter().find(|c| c.id == stale).unwrap();
        assert_eq!(stale_contribution.round_index, 0);
        assert!(!stale_contribution.selected);
        let selected_rounds: Vec<u32> = story
            .selected_contributions()
            .iter()
            .map(|c| c.round_index)
            .collect();
        assert_eq!(selected_rounds, vec![0, 1]);
    }

    #[test]
    fn test_cast_vote_is_idempotent_per_user() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);
        let contribution_id = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        let voter = Uuid::new_v4();

        let first = story
            .cast_vote(voter, contribution_id, Uuid::new_v4(), &clock)
            .unwrap();
        let events_after_first = story.uncommitted_events().len();
        let second = story
            .cast_vote(voter, contribution_id, Uuid::new_v4(), &clock)
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(story.uncommitted_events().len(), events_after_first);
        assert_eq!(story.contributions()[0].vote_count(), 1);
    }

    #[test]
    fn test_self_vote_is_recorded() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);
        let author = Uuid::new_v4();
        let contribution_id = submit(&mut story, author, "A cat.", &clock);

        let recorded = story
            .cast_vote(author, contribution_id, Uuid::new_v4(), &clock)
            .unwrap();

        assert!(recorded);
        assert!(story.contributions()[0].voters.contains(&author));
    }

    #[test]
    fn test_cast_vote_for_unknown_contribution_returns_entity_not_found() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);
        let missing = Uuid::new_v4();

        let result = story.cast_vote(Uuid::new_v4(), missing, Uuid::new_v4(), &clock);

        match result {
            Err(DomainError::EntityNotFound { entity, id }) => {
                assert_eq!(entity, "contribution");
                assert_eq!(id, missing);
            }
            other => panic!("expected EntityNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_close_poll_selects_candidate_above_high_vote_threshold() {
        // Arrange
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog", "bird"], &clock);
        let quiet = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        let popular = submit(&mut story, Uuid::new_v4(), "A dog.", &clock);
        vote(&mut story, popular, 4, &clock);

        // Act
        let selected = story.close_poll_if_due(&high_threshold(3), Uuid::new_v4(), &clock);

        // Assert
        assert_eq!(selected, Some(popular));
        assert_eq!(story.current_round(), 1);
        assert!(!story.contributions().iter().any(|c| c.id == quiet && c.selected));
        match &story.uncommitted_events().last().unwrap().kind {
            StoryEventKind::ContributionSelected(payload) => {
                assert_eq!(payload.contribution_id, popular);
                assert_eq!(payload.round_index, 0);
                assert_eq!(payload.votes, 4);
            }
            other => panic!("expected ContributionSelected, got {other:?}"),
        }
    }

    #[test]
    fn test_close_poll_on_empty_round_is_a_no_op() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);

        let selected = story.close_poll_if_due(&high_threshold(0), Uuid::new_v4(), &clock);

        assert_eq!(selected, None);
        assert_eq!(story.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_close_poll_waits_until_thresholds_are_exceeded() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);
        let contribution_id = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        vote(&mut story, contribution_id, 5, &clock);

        let at_threshold =
            story.close_poll_if_due(&ClosingPolicy::default(), Uuid::new_v4(), &clock);

        assert_eq!(at_threshold, None);
        assert_eq!(story.current_round(), 0);
    }

    #[test]
    fn test_close_poll_after_long_timeout_selects_without_votes() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog"], &clock);
        let first = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        let later = clock.advanced(Duration::hours(25));

        let selected = story.close_poll_if_due(&ClosingPolicy::default(), Uuid::new_v4(), &later);

        assert_eq!(selected, Some(first));
    }

    #[test]
    fn test_close_poll_measures_time_from_latest_submission() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog"], &clock);
        submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        let next_day = clock.advanced(Duration::hours(23));
        submit(&mut story, Uuid::new_v4(), "A dog.", &next_day);
        let check = clock.advanced(Duration::hours(25));

        let selected = story.close_poll_if_due(&ClosingPolicy::default(), Uuid::new_v4(), &check);

        assert_eq!(selected, None);
    }

    #[test]
    fn test_close_poll_after_short_timeout_needs_low_vote_lead() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog"], &clock);
        let contribution_id = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        vote(&mut story, contribution_id, 3, &clock);
        let later = clock.advanced(Duration::hours(2));

        let selected = story.close_poll_if_due(&ClosingPolicy::default(), Uuid::new_v4(), &later);

        assert_eq!(selected, Some(contribution_id));
    }

    #[test]
    fn test_close_poll_breaks_ties_by_submission_order() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog"], &clock);
        let first = submit(&mut story, Uuid::new_v4(), "A cat.", &clock);
        let second = submit(&mut story, Uuid::new_v4(), "A dog.", &clock);
        vote(&mut story, second, 2, &clock);
        vote(&mut story, first, 2, &clock);

        let selected = story.close_poll_if_due(&high_threshold(1), Uuid::new_v4(), &clock);

        assert_eq!(selected, Some(first));
    }

    #[test]
    fn test_at_most_one_selection_per_round_over_many_rounds() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog", "bird", "fish"], &clock);
        let policy = high_threshold(0);

        for text in ["A cat.", "A dog.", "A bird."] {
            let before = story.current_round();
            let a = submit(&mut story, Uuid::new_v4(), text, &clock);
            submit(&mut story, Uuid::new_v4(), text, &clock);
            vote(&mut story, a, 1, &clock);
            story.close_poll_if_due(&policy, Uuid::new_v4(), &clock);
            story.close_poll_if_due(&policy, Uuid::new_v4(), &clock);
            assert!(story.current_round() >= before);
        }

        let mut per_round: BTreeMap<u32, usize> = BTreeMap::new();
        for c in story.contributions().iter().filter(|c| c.selected) {
            *per_round.entry(c.round_index).or_default() += 1;
        }
        assert!(per_round.values().all(|count| *count == 1));
        assert_eq!(story.current_round(), 3);
    }

    #[test]
    fn test_finish_if_exhausted_completes_story_and_blocks_submissions() {
        // Arrange
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "run"], &clock);
        let contribution_id = submit(&mut story, Uuid::new_v4(), "The cat ran.", &clock);
        vote(&mut story, contribution_id, 1, &clock);
        story.close_poll_if_due(&high_threshold(0), Uuid::new_v4(), &clock);

        // Act
        let completed = story.finish_if_exhausted(Uuid::new_v4(), &clock);
        let again = story.finish_if_exhausted(Uuid::new_v4(), &clock);
        let submit_after = story.submit(
            Uuid::new_v4(),
            1,
            "The cat ran.",
            &validator(),
            Uuid::new_v4(),
            &clock,
        );

        // Assert
        assert!(completed);
        assert!(!again);
        assert!(story.is_completed());
        assert!(story.unused_words().is_empty());
        assert!(matches!(submit_after, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn test_finish_if_exhausted_ignores_unselected_candidates() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "run"], &clock);
        submit(&mut story, Uuid::new_v4(), "The cat ran.", &clock);

        let completed = story.finish_if_exhausted(Uuid::new_v4(), &clock);

        assert!(!completed);
        assert_eq!(story.unused_words().len(), 2);
    }

    #[test]
    fn test_eligibility_follows_round_state() {
        // Arrange
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat", "dog"], &clock);
        let author = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let contribution_id = submit(&mut story, author, "A cat.", &clock);

        // Act / Assert
        assert!(!story.is_readable(author));
        assert!(!story.is_writable(author));
        assert!(story.is_readable(reader));
        assert!(story.is_writable(reader));
        assert!(!story.is_reviewable(reader));

        story
            .cast_vote(reader, contribution_id, Uuid::new_v4(), &clock)
            .unwrap();
        assert!(!story.is_readable(reader));
    }

    #[test]
    fn test_review_requires_completed_story() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);

        let result = story.review(
            Uuid::new_v4(),
            ReviewInput {
                flag: false,
                coherence: 5,
                creativity: 5,
                fun: 5,
                comment: String::new(),
            },
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    fn completed_story(clock: &FixedClock) -> Story {
        let mut story = started_story(&["cat"], clock);
        let contribution_id = submit(&mut story, Uuid::new_v4(), "A cat.", clock);
        vote(&mut story, contribution_id, 1, clock);
        story.close_poll_if_due(&high_threshold(0), Uuid::new_v4(), clock);
        assert!(story.finish_if_exhausted(Uuid::new_v4(), clock));
        story
    }

    #[test]
    fn test_review_is_upserted_per_reviewer() {
        let clock = FixedClock::at_default();
        let mut story = completed_story(&clock);
        let reviewer = Uuid::new_v4();
        let input = |fun: i64, comment: &str| ReviewInput {
            flag: false,
            coherence: 7,
            creativity: 8,
            fun,
            comment: comment.to_owned(),
        };
        assert!(story.is_reviewable(reviewer));

        story
            .review(reviewer, input(4, "ok"), Uuid::new_v4(), &clock)
            .unwrap();
        story
            .review(reviewer, input(9, "much better"), Uuid::new_v4(), &clock)
            .unwrap();

        assert_eq!(story.reviews().len(), 1);
        let review = &story.reviews()[&reviewer];
        assert_eq!(review.fun, 9);
        assert_eq!(review.comment, "much better");
        assert!(!story.is_reviewable(reviewer));
    }

    #[test]
    fn test_review_rejects_out_of_range_rating() {
        let clock = FixedClock::at_default();
        let mut story = completed_story(&clock);

        let result = story.review(
            Uuid::new_v4(),
            ReviewInput {
                flag: true,
                coherence: 11,
                creativity: 5,
                fun: 5,
                comment: String::new(),
            },
            Uuid::new_v4(),
            &clock,
        );

        match result {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "coherence rating must be between 1 and 10");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_review_rejects_ratings_outside_a_byte() {
        let clock = FixedClock::at_default();
        let mut story = completed_story(&clock);

        for (fun, creativity) in [(300, 5), (5, -1)] {
            let result = story.review(
                Uuid::new_v4(),
                ReviewInput {
                    flag: false,
                    coherence: 5,
                    creativity,
                    fun,
                    comment: String::new(),
                },
                Uuid::new_v4(),
                &clock,
            );

            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
        assert!(story.reviews().is_empty());
    }

    #[test]
    fn test_review_rejects_overlong_comment() {
        let clock = FixedClock::at_default();
        let mut story = completed_story(&clock);

        let result = story.review(
            Uuid::new_v4(),
            ReviewInput {
                flag: false,
                coherence: 5,
                creativity: 5,
                fun: 5,
                comment: "x".repeat(MAX_REVIEW_COMMENT_LEN + 1),
            },
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_discard_hides_story_and_is_idempotent() {
        let clock = FixedClock::at_default();
        let mut story = started_story(&["cat"], &clock);

        let first = story.discard(Uuid::new_v4(), &clock).unwrap();
        let second = story.discard(Uuid::new_v4(), &clock).unwrap();
        let submit_after = story.submit(
            Uuid::new_v4(),
            0,
            "A cat.",
            &validator(),
            Uuid::new_v4(),
            &clock,
        );

        assert!(first);
        assert!(!second);
        assert!(!story.exists());
        assert!(matches!(submit_after, Err(DomainError::AggregateNotFound(_))));
    }

    #[test]
    fn test_participants_keep_the_time_each_user_first_appeared() {
        let clock = FixedClock::at_default();
        let later = clock.advanced(Duration::hours(3));
        let author = Uuid::new_v4();
        let voter = Uuid::new_v4();
        let mut story = started_story(&["cat"], &clock);
        let contribution_id = submit(&mut story, author, "A cat.", &clock);

        story
            .cast_vote(voter, contribution_id, Uuid::new_v4(), &later)
            .unwrap();
        story.toggle_star(author, Uuid::new_v4(), &later).unwrap();

        assert_eq!(story.participants().len(), 2);
        assert_eq!(story.participants()[&author], clock.0);
        assert_eq!(story.participants()[&voter], later.0);
    }

    #[test]
    fn test_apply_replays_stream_and_tracks_version() {
        let clock = FixedClock::at_default();
        let source = completed_story(&clock);

        let mut replayed = Story::new(source.id);
        for event in source.uncommitted_events() {
            replayed.apply(event);
        }

        assert_eq!(replayed.version(), 5);
        assert!(replayed.is_completed());
        assert_eq!(replayed.current_round(), 1);
        assert_eq!(replayed.selected_contributions().len(), 1);
        assert_eq!(replayed.created_at(), Some(clock.0));
    }
}
