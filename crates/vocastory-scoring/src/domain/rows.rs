//! Row snapshots the scoring engine reads.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One submitted contribution.
#[derive(Debug, Clone)]
pub struct ContributionRow {
    /// The contribution identifier.
    pub contribution_id: Uuid,
    /// The story it was submitted to.
    pub story_id: Uuid,
    /// The submitting user.
    pub author_id: Uuid,
    /// Whether it won its round.
    pub selected: bool,
    /// Distinct voters.
    pub voters: Vec<Uuid>,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// One review of a story.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    /// The reviewed story.
    pub story_id: Uuid,
    /// The reviewing user.
    pub reviewer_id: Uuid,
    /// Coherence rating.
    pub coherence: u8,
    /// Creativity rating.
    pub creativity: u8,
    /// Fun rating.
    pub fun: u8,
    /// Free-text comment.
    pub comment: String,
}

/// One story.
#[derive(Debug, Clone)]
pub struct StoryRow {
    /// The story identifier.
    pub story_id: Uuid,
    /// Display title.
    pub title: String,
    /// Whether the story is complete.
    pub completed: bool,
}
