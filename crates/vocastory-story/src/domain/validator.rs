//! Contribution validation.
//!
//! Turns a raw sentence into the text that is stored and the stylized text
//! that is shown, where the first occurrence of each vocabulary word is
//! linked to the word's catalog entry. The stylized text is HTML: everything
//! the author wrote is escaped, only the links are markup.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use pulldown_cmark_escape::escape_html;
use uuid::Uuid;
use vocastory_core::error::DomainError;
use vocastory_vocabulary::domain::word::Word;

use super::lemmatizer::Lemmatizer;

/// Minimum contribution length after trimming, in characters.
pub const MIN_CONTRIBUTION_CHARS: usize = 3;
/// Maximum stored contribution length, in characters.
pub const MAX_CONTRIBUTION_CHARS: usize = 200;

/// An accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContribution {
    /// Trimmed text ending in punctuation.
    pub text: String,
    /// Text with vocabulary words linked.
    pub stylized_text: String,
    /// Vocabulary words used, sorted by text.
    pub matched_words: Vec<Word>,
}

/// Appends `text` to `out` with HTML special characters escaped.
fn push_escaped(out: &mut String, text: &str) {
    escape_html(out, text).expect("writing to a String is infallible");
}

/// Markup linking `surface` to the catalog entry of `word`.
#[must_use]
pub fn word_link(word: &Word, surface: &str) -> String {
    let mut link = format!("<a href='/api/v1/words/{}'>", word.id);
    push_escaped(&mut link, surface);
    link.push_str("</a>");
    link
}

/// Validates contributions against a story vocabulary.
#[derive(Debug, Clone)]
pub struct ContributionValidator {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl ContributionValidator {
    /// Creates a validator backed by `lemmatizer`.
    #[must_use]
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }

    /// Validates `raw` against `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the text is too short or too
    /// long, cannot be tokenized, or uses no vocabulary word.
    pub fn validate(
        &self,
        raw: &str,
        vocabulary: &[Word],
    ) -> Result<ValidatedContribution, DomainError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_CONTRIBUTION_CHARS {
            return Err(DomainError::Validation(
                "contribution is too short".to_owned(),
            ));
        }

        let mut text = trimmed.to_owned();
        if !text.ends_with(|c: char| c.is_ascii_punctuation()) {
            text.push('.');
        }
        if text.chars().count() > MAX_CONTRIBUTION_CHARS {
            return Err(DomainError::Validation(format!(
                "contribution exceeds {MAX_CONTRIBUTION_CHARS} characters"
            )));
        }

        let tokens = self.lemmatizer.lemmatize(&text).map_err(|e| {
            DomainError::Validation(format!("contribution could not be tokenized: {e}"))
        })?;

        let by_text: HashMap<&str, &Word> =
            vocabulary.iter().map(|w| (w.text.as_str(), w)).collect();
        let mut matched: BTreeMap<&str, &Word> = BTreeMap::new();
        let mut linked: HashSet<(Uuid, &str)> = HashSet::new();
        let mut stylized = String::with_capacity(text.len() * 2);
        let mut cursor = 0;

        for token in &tokens {
            let Some(offset) = text[cursor..].find(&token.surface) else {
                continue;
            };
            let start = cursor + offset;
            let end = start + token.surface.len();

            let lemma = token.lemma.to_lowercase();
            match by_text.get(lemma.as_str()) {
                Some(&word) => {
                    matched.insert(word.text.as_str(), word);
                    push_escaped(&mut stylized, &text[cursor..start]);
                    if linked.insert((word.id, token.surface.as_str())) {
                        stylized.push_str(&word_link(word, &token.surface));
                    } else {
                        push_escaped(&mut stylized, &token.surface);
                    }
                }
                None => push_escaped(&mut stylized, &text[cursor..end]),
            }
            cursor = end;
        }
        push_escaped(&mut stylized, &text[cursor..]);

        if matched.is_empty() {
            return Err(DomainError::Validation("no vocabulary used".to_owned()));
        }

        Ok(ValidatedContribution {
            text,
            stylized_text: stylized,
            matched_words: matched.into_values().cloned().collect(),
        })
    }
}
