//! Canonical word forms.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocastory_core::error::DomainError;

/// Maximum length of a word, in characters.
pub const MAX_WORD_LEN: usize = 30;

/// Namespace for deriving word identities from their normalized text.
const WORD_NAMESPACE: Uuid = Uuid::from_u128(0x7a1e_64c2_93f0_4d8b_a5e1_0c6f_2b9d_3e47);

/// A canonical lemma form.
///
/// Identity is derived from the normalized text, so the same word in two
/// vocabulary sets is the same `Word`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    /// Stable identifier (UUID v5 of the normalized text).
    pub id: Uuid,
    /// Lowercased, trimmed lemma.
    pub text: String,
}

impl Word {
    /// Parses raw input into a canonical word.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the normalized text is empty or
    /// longer than [`MAX_WORD_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let text = normalize(raw);
        if text.is_empty() {
            return Err(DomainError::Validation("word must not be empty".to_owned()));
        }
        if text.chars().count() > MAX_WORD_LEN {
            return Err(DomainError::Validation(format!(
                "word \"{text}\" exceeds {MAX_WORD_LEN} characters"
            )));
        }
        Ok(Self {
            id: word_id(&text),
            text,
        })
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Normalizes raw word input: trimmed and lowercased.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Derives the identity of an already-normalized word.
#[must_use]
pub fn word_id(normalized: &str) -> Uuid {
    Uuid::new_v5(&WORD_NAMESPACE, normalized.as_bytes())
}

/// Parses a list of raw words, dropping duplicates and sorting by text.
///
/// # Errors
///
/// Returns the first `DomainError::Validation` produced by [`Word::parse`].
pub fn parse_word_list<S: AsRef<str>>(raw_words: &[S]) -> Result<Vec<Word>, DomainError> {
    let mut words = raw_words
        .iter()
        .map(|raw| Word::parse(raw.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    words.sort_by(|a, b| a.text.cmp(&b.text));
    words.dedup_by(|a, b| a.id == b.id);
    Ok(words)
}
