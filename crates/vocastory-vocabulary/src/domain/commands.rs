//! Commands for the Word Catalog context.

use uuid::Uuid;
use vocastory_core::command::Command;

/// Command to create a word set from an explicit list of words.
#[derive(Debug, Clone)]
pub struct CreateWordSet {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display title.
    pub title: String,
    /// The authenticated user creating the set.
    pub creator_id: Uuid,
    /// Raw words; normalized and deduplicated on creation.
    pub words: Vec<String>,
}

impl Command for CreateWordSet {
    fn command_type(&self) -> &'static str {
        "vocabulary.create_word_set"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to import a word set from a markdown word list.
#[derive(Debug, Clone)]
pub struct ImportWordSet {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authenticated user importing the set.
    pub creator_id: Uuid,
    /// Markdown source, optionally with YAML front matter.
    pub source: String,
}

impl Command for ImportWordSet {
    fn command_type(&self) -> &'static str {
        "vocabulary.import_word_set"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to star a word set, or unstar it if already starred.
#[derive(Debug, Clone)]
pub struct ToggleWordSetStar {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The word set identifier.
    pub word_set_id: Uuid,
    /// The authenticated user.
    pub user_id: Uuid,
}

impl Command for ToggleWordSetStar {
    fn command_type(&self) -> &'static str {
        "vocabulary.toggle_word_set_star"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete a word set.
#[derive(Debug, Clone)]
pub struct DeleteWordSet {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The word set identifier.
    pub word_set_id: Uuid,
}

impl Command for DeleteWordSet {
    fn command_type(&self) -> &'static str {
        "vocabulary.delete_word_set"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
