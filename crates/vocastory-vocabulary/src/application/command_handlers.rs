//! Command handlers for the Word Catalog context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use tracing::info;
use uuid::Uuid;
use vocastory_core::aggregate::AggregateRoot;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::event::{DomainEvent, EventMetadata};
use vocastory_core::repository::{EventRepository, StoredEvent};

use crate::domain::aggregates::WordSet;
use crate::domain::commands::{CreateWordSet, DeleteWordSet, ImportWordSet, ToggleWordSetStar};
use crate::domain::events::{VocabularyEvent, VocabularyEventKind};
use crate::domain::import::parse_word_list_document;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct VocabularyCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Result of toggling a star.
#[derive(Debug)]
pub struct StarToggled {
    /// Whether the set is starred by the user after the toggle.
    pub starred: bool,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `WordSet` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    word_set_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<WordSet, DomainError> {
    let mut word_set = WordSet::new(word_set_id);
    for stored in existing_events {
        let kind: VocabularyEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = VocabularyEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        word_set.apply(&event);
    }
    Ok(word_set)
}

/// Loads an existing word set.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn load_word_set(
    word_set_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<WordSet, DomainError> {
    let existing_events = repo.load_events(word_set_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(word_set_id));
    }
    reconstitute(word_set_id, &existing_events)
}

async fn persist(
    word_set: &WordSet,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = word_set
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored_event)
        .collect();

    repo.append_events(word_set.id, word_set.version(), &stored_events)
        .await?;

    Ok(stored_events)
}

/// Handles the `CreateWordSet` command: creates a new aggregate and persists
/// the resulting events.
///
/// The handler generates the `word_set_id`.
///
/// # Errors
///
/// Returns `DomainError` if validation or event appending fails.
pub async fn handle_create_word_set(
    command: &CreateWordSet,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VocabularyCommandResult, DomainError> {
    let word_set_id = Uuid::new_v4();
    let mut word_set = WordSet::new(word_set_id);

    word_set.create(
        &command.title,
        command.creator_id,
        &command.words,
        None,
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&word_set, repo).await?;
    info!(
        correlation_id = %command.correlation_id,
        %word_set_id,
        words = word_set.words().len(),
        "word set created"
    );

    Ok(VocabularyCommandResult {
        aggregate_id: word_set_id,
        stored_events,
    })
}

/// Handles the `ImportWordSet` command: parses the markdown word list,
/// creates a new aggregate, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the document cannot be parsed, and
/// `DomainError` if event appending fails.
pub async fn handle_import_word_set(
    command: &ImportWordSet,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VocabularyCommandResult, DomainError> {
    let document = parse_word_list_document(&command.source)?;

    let word_set_id = Uuid::new_v4();
    let mut word_set = WordSet::new(word_set_id);
    word_set.create(
        &document.title,
        command.creator_id,
        &document.words,
        Some(document.source_hash),
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&word_set, repo).await?;
    info!(
        correlation_id = %command.correlation_id,
        %word_set_id,
        words = word_set.words().len(),
        "word set imported"
    );

    Ok(VocabularyCommandResult {
        aggregate_id: word_set_id,
        stored_events,
    })
}

/// Handles the `ToggleWordSetStar` command.
///
/// # Errors
///
/// Returns `DomainError` if the set is missing or deleted, or if event
/// loading or appending fails.
pub async fn handle_toggle_word_set_star(
    command: &ToggleWordSetStar,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StarToggled, DomainError> {
    let mut word_set = load_word_set(command.word_set_id, repo).await?;

    let starred = word_set.toggle_star(command.user_id, command.correlation_id, clock)?;

    let stored_events = persist(&word_set, repo).await?;

    Ok(StarToggled {
        starred,
        stored_events,
    })
}

/// Handles the `DeleteWordSet` command for the word set stream only.
/// Stories written against the set are discarded by the story context.
///
/// # Errors
///
/// Returns `DomainError` if the set is missing or already deleted, or if
/// event loading or appending fails.
pub async fn handle_delete_word_set(
    command: &DeleteWordSet,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VocabularyCommandResult, DomainError> {
    let mut word_set = load_word_set(command.word_set_id, repo).await?;

    word_set.delete(command.correlation_id, clock)?;

    let stored_events = persist(&word_set, repo).await?;
    info!(
        correlation_id = %command.correlation_id,
        word_set_id = %command.word_set_id,
        "word set deleted"
    );

    Ok(VocabularyCommandResult {
        aggregate_id: command.word_set_id,
        stored_events,
    })
}
