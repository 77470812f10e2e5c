//! Domain events for the Story Rounds context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocastory_core::event::{DomainEvent, EventMetadata};
use vocastory_vocabulary::domain::word::Word;

/// Event type for [`StoryStarted`].
pub const STORY_STARTED_EVENT_TYPE: &str = "story.started";
/// Event type for [`ContributionSubmitted`].
pub const CONTRIBUTION_SUBMITTED_EVENT_TYPE: &str = "story.contribution_submitted";
/// Event type for [`VoteCast`].
pub const VOTE_CAST_EVENT_TYPE: &str = "story.vote_cast";
/// Event type for [`ContributionSelected`].
pub const CONTRIBUTION_SELECTED_EVENT_TYPE: &str = "story.contribution_selected";
/// Event type for [`StoryCompleted`].
pub const STORY_COMPLETED_EVENT_TYPE: &str = "story.completed";
/// Event type for [`StoryReviewed`].
pub const STORY_REVIEWED_EVENT_TYPE: &str = "story.reviewed";
/// Event type for [`StoryStarred`].
pub const STORY_STARRED_EVENT_TYPE: &str = "story.starred";
/// Event type for [`StoryUnstarred`].
pub const STORY_UNSTARRED_EVENT_TYPE: &str = "story.unstarred";
/// Event type for [`StoryDiscarded`].
pub const STORY_DISCARDED_EVENT_TYPE: &str = "story.discarded";

/// Emitted when a story is started over a word set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryStarted {
    /// The story identifier.
    pub story_id: Uuid,
    /// The word set the story is written against.
    pub word_set_id: Uuid,
    /// Display title.
    pub title: String,
    /// Snapshot of the word set's words.
    pub vocabulary: Vec<Word>,
}

/// Emitted when a candidate sentence is accepted into a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSubmitted {
    /// The story identifier.
    pub story_id: Uuid,
    /// The new contribution identifier.
    pub contribution_id: Uuid,
    /// The submitting user.
    pub author_id: Uuid,
    /// The round the contribution competes in.
    pub round_index: u32,
    /// Normalized sentence text.
    pub text: String,
    /// Sentence text with vocabulary links.
    pub stylized_text: String,
    /// Identifiers of the vocabulary words used.
    pub matched_word_ids: Vec<Uuid>,
}

/// Emitted when a user votes for a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCast {
    /// The story identifier.
    pub story_id: Uuid,
    /// The candidate voted for.
    pub contribution_id: Uuid,
    /// The voting user.
    pub voter_id: Uuid,
}

/// Emitted when a round closes and its winning candidate becomes story text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionSelected {
    /// The story identifier.
    pub story_id: Uuid,
    /// The selected contribution.
    pub contribution_id: Uuid,
    /// The round that closed.
    pub round_index: u32,
    /// Votes the winner held at closing.
    pub votes: usize,
}

/// Emitted when every vocabulary word has been used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCompleted {
    /// The story identifier.
    pub story_id: Uuid,
}

/// Emitted when a user reviews a completed story, or edits their review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryReviewed {
    /// The story identifier.
    pub story_id: Uuid,
    /// The reviewing user.
    pub reviewer_id: Uuid,
    /// Whether the reviewer reported the story.
    pub flag: bool,
    /// Coherence rating, 1 to 10.
    pub coherence: u8,
    /// Creativity rating, 1 to 10.
    pub creativity: u8,
    /// Fun rating, 1 to 10.
    pub fun: u8,
    /// Free-text comment.
    pub comment: String,
}

/// Emitted when a user stars a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryStarred {
    /// The story identifier.
    pub story_id: Uuid,
    /// The user who starred it.
    pub user_id: Uuid,
}

/// Emitted when a user removes their star.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryUnstarred {
    /// The story identifier.
    pub story_id: Uuid,
    /// The user who unstarred it.
    pub user_id: Uuid,
}

/// Emitted when a story is discarded because its word set was deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDiscarded {
    /// The story identifier.
    pub story_id: Uuid,
    /// The deleted word set.
    pub word_set_id: Uuid,
}

/// Event payload variants for the Story Rounds context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoryEventKind {
    /// A story has been started.
    StoryStarted(StoryStarted),
    /// A candidate has been submitted.
    ContributionSubmitted(ContributionSubmitted),
    /// A vote has been cast.
    VoteCast(VoteCast),
    /// A round has closed on a candidate.
    ContributionSelected(ContributionSelected),
    /// The story is complete.
    StoryCompleted(StoryCompleted),
    /// A review has been submitted or edited.
    StoryReviewed(StoryReviewed),
    /// A user starred the story.
    StoryStarred(StoryStarred),
    /// A user unstarred the story.
    StoryUnstarred(StoryUnstarred),
    /// The story has been discarded.
    StoryDiscarded(StoryDiscarded),
}

impl StoryEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StoryStarted(_) => STORY_STARTED_EVENT_TYPE,
            Self::ContributionSubmitted(_) => CONTRIBUTION_SUBMITTED_EVENT_TYPE,
            Self::VoteCast(_) => VOTE_CAST_EVENT_TYPE,
            Self::ContributionSelected(_) => CONTRIBUTION_SELECTED_EVENT_TYPE,
            Self::StoryCompleted(_) => STORY_COMPLETED_EVENT_TYPE,
            Self::StoryReviewed(_) => STORY_REVIEWED_EVENT_TYPE,
            Self::StoryStarred(_) => STORY_STARRED_EVENT_TYPE,
            Self::StoryUnstarred(_) => STORY_UNSTARRED_EVENT_TYPE,
            Self::StoryDiscarded(_) => STORY_DISCARDED_EVENT_TYPE,
        }
    }

    /// The user this event names, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::ContributionSubmitted(e) => Some(e.author_id),
            Self::VoteCast(e) => Some(e.voter_id),
            Self::StoryReviewed(e) => Some(e.reviewer_id),
            Self::StoryStarred(e) => Some(e.user_id),
            Self::StoryUnstarred(e) => Some(e.user_id),
            Self::StoryStarted(_)
            | Self::ContributionSelected(_)
            | Self::StoryCompleted(_)
            | Self::StoryDiscarded(_) => None,
        }
    }
}

/// Domain event envelope for the Story Rounds context.
#[derive(Debug, Clone)]
pub struct StoryEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: StoryEventKind,
}

impl DomainEvent for StoryEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("StoryEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
