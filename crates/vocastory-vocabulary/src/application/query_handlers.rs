//! Query handlers for the Word Catalog context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use vocastory_core::error::DomainError;
use vocastory_core::repository::EventRepository;

use crate::application::command_handlers;
use crate::domain::aggregates::WordSet;
use crate::domain::events::WORD_SET_CREATED_EVENT_TYPE;
use crate::domain::word::Word;

/// Read-only view of a word set.
#[derive(Debug, Serialize)]
pub struct WordSetView {
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// Display title.
    pub title: String,
    /// The curating user.
    pub creator_id: Option<Uuid>,
    /// Words sorted by text.
    pub words: Vec<Word>,
    /// Number of users who starred the set.
    pub star_count: usize,
    /// Whether the viewer starred the set.
    pub starred_by_viewer: bool,
    /// SHA-256 of the imported source, if imported.
    pub source_hash: Option<String>,
    /// Whether the set has been deleted.
    pub deleted: bool,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

/// Compact listing row for a live word set.
#[derive(Debug, Serialize)]
pub struct WordSetSummary {
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// Display title.
    pub title: String,
    /// Number of words in the set.
    pub word_count: usize,
    /// Number of users who starred the set.
    pub star_count: usize,
    /// Whether the viewer starred the set.
    pub starred_by_viewer: bool,
}

/// Catalog view of a single word.
#[derive(Debug, Serialize)]
pub struct WordView {
    /// The word identifier.
    pub word_id: Uuid,
    /// The lemma.
    pub text: String,
    /// Live word sets containing the word.
    pub word_set_ids: Vec<Uuid>,
}

fn to_view(word_set: &WordSet, viewer: Option<Uuid>) -> WordSetView {
    WordSetView {
        word_set_id: word_set.id,
        title: word_set.title.clone(),
        creator_id: word_set.creator_id,
        words: word_set.words.clone(),
        star_count: word_set.starred_by.len(),
        starred_by_viewer: viewer.is_some_and(|v| word_set.starred_by.contains(&v)),
        source_hash: word_set.source_hash.clone(),
        deleted: word_set.deleted,
        created_at: word_set.created_at,
        version: word_set.version,
    }
}

/// Loads every word set ever created, deleted ones included, in creation
/// order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn load_all_word_sets(repo: &dyn EventRepository) -> Result<Vec<WordSet>, DomainError> {
    let ids = repo.list_aggregate_ids(WORD_SET_CREATED_EVENT_TYPE).await?;
    let mut word_sets = Vec::with_capacity(ids.len());
    for id in ids {
        let events = repo.load_events(id).await?;
        word_sets.push(command_handlers::reconstitute(id, &events)?);
    }
    Ok(word_sets)
}

/// Retrieves a word set by its aggregate ID. Deleted sets are still
/// returned, flagged as deleted.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_word_set_by_id(
    word_set_id: Uuid,
    viewer: Option<Uuid>,
    repo: &dyn EventRepository,
) -> Result<WordSetView, DomainError> {
    let word_set = command_handlers::load_word_set(word_set_id, repo).await?;
    Ok(to_view(&word_set, viewer))
}

/// Lists live word sets in creation order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_word_sets(
    viewer: Option<Uuid>,
    repo: &dyn EventRepository,
) -> Result<Vec<WordSetSummary>, DomainError> {
    Ok(load_all_word_sets(repo)
        .await?
        .into_iter()
        .filter(|ws| !ws.deleted)
        .map(|ws| WordSetSummary {
            word_set_id: ws.id,
            word_count: ws.words.len(),
            star_count: ws.starred_by.len(),
            starred_by_viewer: viewer.is_some_and(|v| ws.starred_by.contains(&v)),
            title: ws.title,
        })
        .collect())
}

/// Looks a word up in the catalog of live word sets.
///
/// # Errors
///
/// Returns `DomainError::EntityNotFound` if no live set contains the word.
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_word_by_id(
    word_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<WordView, DomainError> {
    let mut found: Option<Word> = None;
    let mut word_set_ids = Vec::new();

    for word_set in load_all_word_sets(repo).await? {
        if word_set.deleted {
            continue;
        }
        if let Some(word) = word_set.words.iter().find(|w| w.id == word_id) {
            found.get_or_insert_with(|| word.clone());
            word_set_ids.push(word_set.id);
        }
    }

    let word = found.ok_or(DomainError::EntityNotFound {
        entity: "word",
        id: word_id,
    })?;
    Ok(WordView {
        word_id: word.id,
        text: word.text,
        word_set_ids,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vocastory_core::error::DomainError;
    use vocastory_test_support::{EmptyEventRepository, FixedClock, InMemoryEventRepository};

    use super::*;
    use crate::application::command_handlers::{
        handle_create_word_set, handle_delete_word_set, handle_toggle_word_set_star,
    };
    use crate::domain::commands::{CreateWordSet, DeleteWordSet, ToggleWordSetStar};
    use crate::domain::word::word_id;

    async fn create(repo: &InMemoryEventRepository, title: &str, words: &[&str]) -> Uuid {
        let command = CreateWordSet {
            correlation_id: Uuid::new_v4(),
            title: title.to_owned(),
            creator_id: Uuid::new_v4(),
            words: words.iter().map(|w| (*w).to_owned()).collect(),
        };
        handle_create_word_set(&command, &FixedClock::at_default(), repo)
            .await
            .unwrap()
            .aggregate_id
    }

    #[tokio::test]
    async fn test_get_word_set_by_id_returns_view_with_viewer_star() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let word_set_id = create(&repo, "Animals", &["run", "cat"]).await;
        let viewer = Uuid::new_v4();
        let star = ToggleWordSetStar {
            correlation_id: Uuid::new_v4(),
            word_set_id,
            user_id: viewer,
        };
        handle_toggle_word_set_star(&star, &FixedClock::at_default(), &repo)
            .await
            .unwrap();

        // Act
        let view = get_word_set_by_id(word_set_id, Some(viewer), &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(view.title, "Animals");
        let texts: Vec<&str> = view.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["cat", "run"]);
        assert_eq!(view.star_count, 1);
        assert!(view.starred_by_viewer);
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_word_set_by_id_returns_not_found_when_no_events() {
        let word_set_id = Uuid::new_v4();

        let result = get_word_set_by_id(word_set_id, None, &EmptyEventRepository).await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, word_set_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_word_sets_hides_deleted_sets() {
        let repo = InMemoryEventRepository::new();
        let kept = create(&repo, "Kept", &["cat"]).await;
        let dropped = create(&repo, "Dropped", &["dog"]).await;
        let delete = DeleteWordSet {
            correlation_id: Uuid::new_v4(),
            word_set_id: dropped,
        };
        handle_delete_word_set(&delete, &FixedClock::at_default(), &repo)
            .await
            .unwrap();

        let listed = list_word_sets(None, &repo).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].word_set_id, kept);
        assert_eq!(listed[0].word_count, 1);
        assert!(!listed[0].starred_by_viewer);
    }

    #[tokio::test]
    async fn test_get_word_by_id_lists_every_set_sharing_the_word() {
        let repo = InMemoryEventRepository::new();
        let first = create(&repo, "First", &["cat", "run"]).await;
        let second = create(&repo, "Second", &["Cat"]).await;

        let view = get_word_by_id(word_id("cat"), &repo).await.unwrap();

        assert_eq!(view.text, "cat");
        assert_eq!(view.word_set_ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_get_word_by_id_returns_entity_not_found_for_unknown_word() {
        let repo = InMemoryEventRepository::new();
        create(&repo, "Animals", &["cat"]).await;
        let missing = word_id("zebra");

        let result = get_word_by_id(missing, &repo).await;

        match result {
            Err(DomainError::EntityNotFound { entity, id }) => {
                assert_eq!(entity, "word");
                assert_eq!(id, missing);
            }
            other => panic!("expected EntityNotFound, got {other:?}"),
        }
    }
}
