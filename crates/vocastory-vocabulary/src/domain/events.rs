//! Domain events for the Word Catalog context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocastory_core::event::{DomainEvent, EventMetadata};

use super::word::Word;

/// Event type for [`WordSetCreated`].
pub const WORD_SET_CREATED_EVENT_TYPE: &str = "vocabulary.word_set_created";
/// Event type for [`WordSetStarred`].
pub const WORD_SET_STARRED_EVENT_TYPE: &str = "vocabulary.word_set_starred";
/// Event type for [`WordSetUnstarred`].
pub const WORD_SET_UNSTARRED_EVENT_TYPE: &str = "vocabulary.word_set_unstarred";
/// Event type for [`WordSetDeleted`].
pub const WORD_SET_DELETED_EVENT_TYPE: &str = "vocabulary.word_set_deleted";

/// Emitted when a vocabulary set is created or imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSetCreated {
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// Display title.
    pub title: String,
    /// The user who curated the set.
    pub creator_id: Uuid,
    /// Canonical words, sorted by text.
    pub words: Vec<Word>,
    /// SHA-256 of the imported markdown source, if imported.
    pub source_hash: Option<String>,
}

/// Emitted when a user stars a word set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSetStarred {
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// The user who starred it.
    pub user_id: Uuid,
}

/// Emitted when a user removes their star.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSetUnstarred {
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// The user who unstarred it.
    pub user_id: Uuid,
}

/// Emitted when a word set is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSetDeleted {
    /// The word set identifier.
    pub word_set_id: Uuid,
}

/// Event payload variants for the Word Catalog context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VocabularyEventKind {
    /// A word set has been created.
    WordSetCreated(WordSetCreated),
    /// A user starred the word set.
    WordSetStarred(WordSetStarred),
    /// A user unstarred the word set.
    WordSetUnstarred(WordSetUnstarred),
    /// The word set has been deleted.
    WordSetDeleted(WordSetDeleted),
}

impl VocabularyEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WordSetCreated(_) => WORD_SET_CREATED_EVENT_TYPE,
            Self::WordSetStarred(_) => WORD_SET_STARRED_EVENT_TYPE,
            Self::WordSetUnstarred(_) => WORD_SET_UNSTARRED_EVENT_TYPE,
            Self::WordSetDeleted(_) => WORD_SET_DELETED_EVENT_TYPE,
        }
    }

    /// The user this event names, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::WordSetCreated(e) => Some(e.creator_id),
            Self::WordSetStarred(e) => Some(e.user_id),
            Self::WordSetUnstarred(e) => Some(e.user_id),
            Self::WordSetDeleted(_) => None,
        }
    }
}

/// Domain event envelope for the Word Catalog context.
#[derive(Debug, Clone)]
pub struct VocabularyEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: VocabularyEventKind,
}

impl DomainEvent for VocabularyEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("VocabularyEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
