//! Command handlers for the Story Rounds context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.
//! Every handler touching an existing story runs through [`execute`], which
//! refuses stories of a deleted word set and retries once when another
//! writer advanced the stream first.

use tracing::{info, warn};
use uuid::Uuid;
use vocastory_core::aggregate::AggregateRoot;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::event::{DomainEvent, EventMetadata};
use vocastory_core::repository::{EventRepository, StoredEvent};
use vocastory_vocabulary::application::command_handlers as vocabulary;
use vocastory_vocabulary::domain::commands::DeleteWordSet;

use crate::application::query_handlers::load_all_stories;
use crate::domain::aggregates::{ReviewInput, Story};
use crate::domain::commands::{
    CastVote, ReviewStory, StartStory, SubmitContribution, ToggleStoryStar,
};
use crate::domain::events::{StoryEvent, StoryEventKind};
use crate::domain::policy::ClosingPolicy;
use crate::domain::validator::ContributionValidator;

/// Attempts per command before a concurrency conflict is surfaced.
const MAX_ATTEMPTS: u32 = 2;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct StoryCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Result of an accepted submission.
#[derive(Debug)]
pub struct SubmissionAccepted {
    /// The new contribution.
    pub contribution_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Everything one vote decided.
#[derive(Debug)]
pub struct VoteOutcome {
    /// Whether the vote was new; repeat votes change nothing.
    pub recorded: bool,
    /// The contribution selected because this vote closed the round.
    pub selected_contribution_id: Option<Uuid>,
    /// Whether this vote completed the story.
    pub completed: bool,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Result of toggling a story star.
#[derive(Debug)]
pub struct StoryStarToggled {
    /// Whether the story is starred by the user after the toggle.
    pub starred: bool,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Result of deleting a word set together with its stories.
#[derive(Debug)]
pub struct WordSetDeleted {
    /// The deleted word set.
    pub word_set_id: Uuid,
    /// Stories discarded with it.
    pub discarded_story_ids: Vec<Uuid>,
}

/// Reconstitutes a `Story` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(story_id: Uuid, existing_events: &[StoredEvent]) -> Result<Story, DomainError> {
    let mut story = Story::new(story_id);
    for stored in existing_events {
        let kind: StoryEventKind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })?;
        let event = StoryEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        story.apply(&event);
    }
    Ok(story)
}

/// Loads an existing story. Discarded stories count as missing.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the story does not exist.
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn load_story(story_id: Uuid, repo: &dyn EventRepository) -> Result<Story, DomainError> {
    let existing_events = repo.load_events(story_id).await?;
    let story = reconstitute(story_id, &existing_events)?;
    if !story.exists() {
        return Err(DomainError::AggregateNotFound(story_id));
    }
    Ok(story)
}

fn to_stored_events(story: &Story) -> Vec<StoredEvent> {
    story
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored_event)
        .collect()
}

/// Whether a command may act on a story whose word set has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordSetGuard {
    RequireLive,
    AllowDeleted,
}

/// Fails with `InvalidState` when the story's word set has been deleted but
/// the cascade has not discarded the story yet.
async fn ensure_word_set_live(
    story: &Story,
    repo: &dyn EventRepository,
) -> Result<(), DomainError> {
    let Some(word_set_id) = story.word_set_id() else {
        return Ok(());
    };
    if vocabulary::load_word_set(word_set_id, repo)
        .await?
        .is_deleted()
    {
        return Err(DomainError::InvalidState(format!(
            "story {} belongs to deleted word set {word_set_id}",
            story.id
        )));
    }
    Ok(())
}

/// Loads the story, runs `operate` against it, and appends whatever it
/// raised in one batch. On a concurrency conflict the story is reloaded and
/// `operate` runs again once; a second conflict is returned to the caller.
async fn execute<T, F>(
    story_id: Uuid,
    repo: &dyn EventRepository,
    operate: F,
) -> Result<(T, Vec<StoredEvent>), DomainError>
where
    F: FnMut(&mut Story) -> Result<T, DomainError> + Send,
    T: Send,
{
    execute_guarded(story_id, repo, WordSetGuard::RequireLive, operate).await
}

async fn execute_guarded<T, F>(
    story_id: Uuid,
    repo: &dyn EventRepository,
    guard: WordSetGuard,
    mut operate: F,
) -> Result<(T, Vec<StoredEvent>), DomainError>
where
    F: FnMut(&mut Story) -> Result<T, DomainError> + Send,
    T: Send,
{
    let mut attempt = 1;
    loop {
        let mut story = load_story(story_id, repo).await?;
        if guard == WordSetGuard::RequireLive {
            ensure_word_set_live(&story, repo).await?;
        }
        let outcome = operate(&mut story)?;

        let stored_events = to_stored_events(&story);
        if stored_events.is_empty() {
            return Ok((outcome, stored_events));
        }

        match repo
            .append_events(story_id, story.version(), &stored_events)
            .await
        {
            Ok(()) => return Ok((outcome, stored_events)),
            Err(err) if err.is_concurrency_conflict() && attempt < MAX_ATTEMPTS => {
                warn!(%story_id, attempt, error = %err, "story stream moved, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Handles the `StartStory` command: snapshots the word set's vocabulary
/// into a new story.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the word set does not exist,
/// `DomainError::InvalidState` if it has been deleted, and
/// `DomainError::Validation` for an invalid title.
pub async fn handle_start_story(
    command: &StartStory,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StoryCommandResult, DomainError> {
    let word_set = vocabulary::load_word_set(command.word_set_id, repo).await?;
    if word_set.is_deleted() {
        return Err(DomainError::InvalidState(format!(
            "word set {} has been deleted",
            command.word_set_id
        )));
    }

    let title = match &command.title {
        Some(title) => title.clone(),
        None => {
            let existing = load_all_stories(repo)
                .await?
                .iter()
                .filter(|s| s.word_set_id() == Some(command.word_set_id))
                .count();
            format!("{} #{}", word_set.title(), existing + 1)
        }
    };

    let story_id = Uuid::new_v4();
    let mut story = Story::new(story_id);
    story.start(
        command.word_set_id,
        &title,
        word_set.words().to_vec(),
        command.correlation_id,
        clock,
    )?;

    let stored_events = to_stored_events(&story);
    repo.append_events(story_id, story.version(), &stored_events)
        .await?;

    // A delete that landed between the check above and the append has
    // already swept the set's stories; discard this one as well.
    if vocabulary::load_word_set(command.word_set_id, repo)
        .await?
        .is_deleted()
    {
        execute_guarded(story_id, repo, WordSetGuard::AllowDeleted, |story| {
            story.discard(command.correlation_id, clock)
        })
        .await?;
        warn!(
            %story_id,
            word_set_id = %command.word_set_id,
            "word set deleted while starting story"
        );
        return Err(DomainError::InvalidState(format!(
            "word set {} has been deleted",
            command.word_set_id
        )));
    }

    info!(
        correlation_id = %command.correlation_id,
        %story_id,
        word_set_id = %command.word_set_id,
        "story started"
    );

    Ok(StoryCommandResult {
        aggregate_id: story_id,
        stored_events,
    })
}

/// Handles the `SubmitContribution` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the text is rejected (nothing is
/// persisted), `DomainError::InvalidState` if the story is complete or the
/// round is ahead of the story, and `DomainError::AggregateNotFound` for an
/// unknown story.
pub async fn handle_submit_contribution(
    command: &SubmitContribution,
    validator: &ContributionValidator,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SubmissionAccepted, DomainError> {
    let (contribution_id, stored_events) = execute(command.story_id, repo, |story| {
        story.submit(
            command.author_id,
            command.round_index,
            &command.text,
            validator,
            command.correlation_id,
            clock,
        )
    })
    .await?;

    info!(
        correlation_id = %command.correlation_id,
        story_id = %command.story_id,
        %contribution_id,
        round_index = command.round_index,
        "contribution accepted"
    );
    Ok(SubmissionAccepted {
        contribution_id,
        stored_events,
    })
}

/// Handles the `CastVote` command: records the vote, closes the round if
/// due, and completes the story if its vocabulary is exhausted, persisting
/// all of it atomically.
///
/// # Errors
///
/// Returns `DomainError::EntityNotFound` for an unknown contribution,
/// `DomainError::InvalidState` if the story is complete or the contribution
/// is not a current candidate, and `DomainError::ConcurrencyConflict` if the
/// retry also lost a race.
pub async fn handle_cast_vote(
    command: &CastVote,
    policy: &ClosingPolicy,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VoteOutcome, DomainError> {
    let ((recorded, selected_contribution_id, completed), stored_events) =
        execute(command.story_id, repo, |story| {
            let recorded = story.cast_vote(
                command.voter_id,
                command.contribution_id,
                command.correlation_id,
                clock,
            )?;
            let selected = story.close_poll_if_due(policy, command.correlation_id, clock);
            let completed = story.finish_if_exhausted(command.correlation_id, clock);
            Ok((recorded, selected, completed))
        })
        .await?;

    if let Some(contribution_id) = selected_contribution_id {
        info!(
            correlation_id = %command.correlation_id,
            story_id = %command.story_id,
            %contribution_id,
            "round closed"
        );
    }
    if completed {
        info!(
            correlation_id = %command.correlation_id,
            story_id = %command.story_id,
            "story completed"
        );
    }

    Ok(VoteOutcome {
        recorded,
        selected_contribution_id,
        completed,
        stored_events,
    })
}

/// Handles the `ReviewStory` command.
///
/// # Errors
///
/// Returns `DomainError::InvalidState` if the story is not complete and
/// `DomainError::Validation` for invalid ratings or comment.
pub async fn handle_review_story(
    command: &ReviewStory,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StoryCommandResult, DomainError> {
    let ((), stored_events) = execute(command.story_id, repo, |story| {
        story.review(
            command.reviewer_id,
            ReviewInput {
                flag: command.flag,
                coherence: command.coherence,
                creativity: command.creativity,
                fun: command.fun,
                comment: command.comment.clone(),
            },
            command.correlation_id,
            clock,
        )
    })
    .await?;

    Ok(StoryCommandResult {
        aggregate_id: command.story_id,
        stored_events,
    })
}

/// Handles the `ToggleStoryStar` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown story.
pub async fn handle_toggle_story_star(
    command: &ToggleStoryStar,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StoryStarToggled, DomainError> {
    let (starred, stored_events) = execute(command.story_id, repo, |story| {
        story.toggle_star(command.user_id, command.correlation_id, clock)
    })
    .await?;

    Ok(StoryStarToggled {
        starred,
        stored_events,
    })
}

/// Handles the `DeleteWordSet` command end to end: deletes the word set,
/// then discards every story written against it.
///
/// Each stream is appended separately. A failure part way leaves the set
/// deleted and some stories undiscarded; those reject every command until
/// the delete is repeated, which skips the set and finishes the sweep.
///
/// # Errors
///
/// Returns `DomainError` if the set is missing, or if loading or appending
/// fails.
pub async fn handle_delete_word_set(
    command: &DeleteWordSet,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<WordSetDeleted, DomainError> {
    let word_set = vocabulary::load_word_set(command.word_set_id, repo).await?;
    if word_set.is_deleted() {
        info!(
            correlation_id = %command.correlation_id,
            word_set_id = %command.word_set_id,
            "word set already deleted, resuming story sweep"
        );
    } else {
        vocabulary::handle_delete_word_set(command, clock, repo).await?;
    }

    let mut discarded_story_ids = Vec::new();
    for story in load_all_stories(repo).await? {
        if story.word_set_id() != Some(command.word_set_id) {
            continue;
        }
        let (discarded, _) =
            execute_guarded(story.id, repo, WordSetGuard::AllowDeleted, |story| {
                story.discard(command.correlation_id, clock)
            })
            .await?;
        if discarded {
            discarded_story_ids.push(story.id);
        }
    }

    info!(
        correlation_id = %command.correlation_id,
        word_set_id = %command.word_set_id,
        discarded = discarded_story_ids.len(),
        "word set deleted with its stories"
    );
    Ok(WordSetDeleted {
        word_set_id: command.word_set_id,
        discarded_story_ids,
    })
}
