//! Aggregate roots for the Word Catalog context.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use vocastory_core::aggregate::AggregateRoot;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    VocabularyEvent, VocabularyEventKind, WordSetCreated, WordSetDeleted, WordSetStarred,
    WordSetUnstarred,
};
use super::word::{Word, parse_word_list};

/// Maximum length of a word set title, in characters.
pub const MAX_TITLE_LEN: usize = 50;

/// The aggregate root for a vocabulary set.
#[derive(Debug)]
pub struct WordSet {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (stored event count).
    pub(crate) version: i64,
    /// Display title.
    pub(crate) title: String,
    /// The curating user.
    pub(crate) creator_id: Option<Uuid>,
    /// Canonical words, sorted by text.
    pub(crate) words: Vec<Word>,
    /// SHA-256 of the imported source, if any.
    pub(crate) source_hash: Option<String>,
    /// When the set was created.
    pub(crate) created_at: Option<DateTime<Utc>>,
    /// Users who starred the set.
    pub(crate) starred_by: BTreeSet<Uuid>,
    /// Whether the set has been deleted.
    pub(crate) deleted: bool,
    /// When each user first appeared in this stream.
    pub(crate) participants: BTreeMap<Uuid, DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<VocabularyEvent>,
}

impl WordSet {
    /// Creates an empty word set shell for reconstitution.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            title: String::new(),
            creator_id: None,
            words: Vec::new(),
            source_hash: None,
            created_at: None,
            starred_by: BTreeSet::new(),
            deleted: false,
            participants: BTreeMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The words of this set, sorted by text.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The curating user, once created.
    #[must_use]
    pub fn creator_id(&self) -> Option<Uuid> {
        self.creator_id
    }

    /// Creation time, once created.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Users who starred this set.
    #[must_use]
    pub fn starred_by(&self) -> &BTreeSet<Uuid> {
        &self.starred_by
    }

    /// Every user named by this stream, with the time of their first event.
    #[must_use]
    pub fn participants(&self) -> &BTreeMap<Uuid, DateTime<Utc>> {
        &self.participants
    }

    /// Whether the set has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Whether a creation event exists (stored or pending).
    #[must_use]
    pub fn exists(&self) -> bool {
        self.created_at.is_some()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Records a new event: mutates state and queues it for persistence.
    fn raise(&mut self, kind: VocabularyEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let metadata = EventMetadata::new(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.mutate(&kind, metadata.occurred_at);
        self.uncommitted_events.push(VocabularyEvent { metadata, kind });
    }

    fn mutate(&mut self, kind: &VocabularyEventKind, occurred_at: DateTime<Utc>) {
        if let Some(user_id) = kind.user_id() {
            self.participants.entry(user_id).or_insert(occurred_at);
        }
        match kind {
            VocabularyEventKind::WordSetCreated(payload) => {
                self.title.clone_from(&payload.title);
                self.creator_id = Some(payload.creator_id);
                self.words.clone_from(&payload.words);
                self.source_hash.clone_from(&payload.source_hash);
                self.created_at = Some(occurred_at);
            }
            VocabularyEventKind::WordSetStarred(payload) => {
                self.starred_by.insert(payload.user_id);
            }
            VocabularyEventKind::WordSetUnstarred(payload) => {
                self.starred_by.remove(&payload.user_id);
            }
            VocabularyEventKind::WordSetDeleted(_) => {
                self.deleted = true;
            }
        }
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        if self.deleted {
            return Err(DomainError::InvalidState(format!(
                "word set {} has been deleted",
                self.id
            )));
        }
        Ok(())
    }

    /// Creates the word set, producing a `WordSetCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the set already exists, and
    /// `DomainError::Validation` if the title or word list is invalid.
    pub fn create(
        &mut self,
        title: &str,
        creator_id: Uuid,
        raw_words: &[String],
        source_hash: Option<String>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.exists() {
            return Err(DomainError::InvalidState(format!(
                "word set {} already exists",
                self.id
            )));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation(
                "word set title must not be empty".to_owned(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "word set title exceeds {MAX_TITLE_LEN} characters"
            )));
        }

        let words = parse_word_list(raw_words)?;
        if words.is_empty() {
            return Err(DomainError::Validation(
                "word set must contain at least one word".to_owned(),
            ));
        }

        self.raise(
            VocabularyEventKind::WordSetCreated(WordSetCreated {
                word_set_id: self.id,
                title: title.to_owned(),
                creator_id,
                words,
                source_hash,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Stars the set for `user_id`, or removes the star if present.
    /// Returns whether the set is starred by the user afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the set was never created
    /// and `DomainError::InvalidState` if it has been deleted.
    pub fn toggle_star(
        &mut self,
        user_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.ensure_live()?;

        let starred = self.starred_by.contains(&user_id);
        let kind = if starred {
            VocabularyEventKind::WordSetUnstarred(WordSetUnstarred {
                word_set_id: self.id,
                user_id,
            })
        } else {
            VocabularyEventKind::WordSetStarred(WordSetStarred {
                word_set_id: self.id,
                user_id,
            })
        };
        self.raise(kind, correlation_id, clock);
        Ok(!starred)
    }

    /// Deletes the set, producing a `WordSetDeleted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the set was never created
    /// and `DomainError::InvalidState` if it is already deleted.
    pub fn delete(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_live()?;

        self.raise(
            VocabularyEventKind::WordSetDeleted(WordSetDeleted {
                word_set_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for WordSet {
    type Event = VocabularyEvent;

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
