//! Commands for the Story Rounds context.

use uuid::Uuid;
use vocastory_core::command::Command;

/// Command to start a story over a word set.
#[derive(Debug, Clone)]
pub struct StartStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The word set to write against.
    pub word_set_id: Uuid,
    /// Optional title; defaults to the set title and a running number.
    pub title: Option<String>,
}

impl Command for StartStory {
    fn command_type(&self) -> &'static str {
        "story.start_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to submit a candidate sentence.
#[derive(Debug, Clone)]
pub struct SubmitContribution {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story identifier.
    pub story_id: Uuid,
    /// The authenticated user submitting.
    pub author_id: Uuid,
    /// The round the author is writing for.
    pub round_index: u32,
    /// Raw sentence text.
    pub text: String,
}

impl Command for SubmitContribution {
    fn command_type(&self) -> &'static str {
        "story.submit_contribution"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to vote for a candidate. Voting may close the round.
#[derive(Debug, Clone)]
pub struct CastVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story identifier.
    pub story_id: Uuid,
    /// The authenticated user voting.
    pub voter_id: Uuid,
    /// The candidate voted for.
    pub contribution_id: Uuid,
}

impl Command for CastVote {
    fn command_type(&self) -> &'static str {
        "story.cast_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to review a completed story, replacing any earlier review by the
/// same user.
#[derive(Debug, Clone)]
pub struct ReviewStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story identifier.
    pub story_id: Uuid,
    /// The authenticated reviewer.
    pub reviewer_id: Uuid,
    /// Whether the reviewer reports the story.
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

impl Command for ReviewStory {
    fn command_type(&self) -> &'static str {
        "story.review_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to star a story, or unstar it if already starred.
#[derive(Debug, Clone)]
pub struct ToggleStoryStar {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story identifier.
    pub story_id: Uuid,
    /// The authenticated user.
    pub user_id: Uuid,
}

impl Command for ToggleStoryStar {
    fn command_type(&self) -> &'static str {
        "story.toggle_story_star"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
