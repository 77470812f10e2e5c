//! Lemmatization oracle.
//!
//! Contribution validation only needs a pure `text -> [(surface, lemma)]`
//! function. The trait is the seam; [`RuleLemmatizer`] is a small
//! dictionary-plus-suffix implementation good enough for the English word
//! lists the game ships with. A model-backed implementation can be injected
//! at bootstrap instead.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// One lexical token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token exactly as written.
    pub surface: String,
    /// The lowercase base form.
    pub lemma: String,
}

/// Failure to tokenize input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LemmatizeError {
    /// The text contains a control character.
    #[error("text contains control character U+{0:04X}")]
    ControlCharacter(u32),
}

/// Reduces a sentence to tokens and their base forms.
pub trait Lemmatizer: Send + Sync + fmt::Debug {
    /// Tokenizes `text`, returning tokens in order of appearance.
    ///
    /// # Errors
    ///
    /// Returns `LemmatizeError` if the text cannot be tokenized.
    fn lemmatize(&self, text: &str) -> Result<Vec<Token>, LemmatizeError>;
}

const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("am", "be"),
    ("are", "be"),
    ("is", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("goes", "go"),
    ("going", "go"),
    ("went", "go"),
    ("gone", "go"),
    ("ran", "run"),
    ("sat", "sit"),
    ("saw", "see"),
    ("seen", "see"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("came", "come"),
    ("took", "take"),
    ("taken", "take"),
    ("made", "make"),
    ("said", "say"),
    ("got", "get"),
    ("gave", "give"),
    ("given", "give"),
    ("knew", "know"),
    ("known", "know"),
    ("found", "find"),
    ("thought", "think"),
    ("told", "tell"),
    ("wrote", "write"),
    ("written", "write"),
    ("began", "begin"),
    ("begun", "begin"),
    ("flew", "fly"),
    ("flown", "fly"),
    ("swam", "swim"),
    ("stood", "stand"),
    ("felt", "feel"),
    ("left", "leave"),
    ("brought", "bring"),
    ("bought", "buy"),
    ("caught", "catch"),
    ("taught", "teach"),
    ("slept", "sleep"),
    ("kept", "keep"),
    ("met", "meet"),
    ("sang", "sing"),
    ("sung", "sing"),
    ("drank", "drink"),
    ("drunk", "drink"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("people", "person"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn has_vowel(stem: &str) -> bool {
    stem.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Undoes consonant doubling (`runn` -> `run`) and restores a silent `e`
/// on short consonant-vowel-consonant stems (`hop` -> `hope`).
fn repair_stem(stem: &str, doubled_means_single: bool) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if doubled_means_single
        && n >= 3
        && chars[n - 1] == chars[n - 2]
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'l' | 's' | 'z')
    {
        return chars[..n - 1].iter().collect();
    }
    if n == 3
        && !is_vowel(chars[0])
        && is_vowel(chars[1])
        && !is_vowel(chars[2])
        && !matches!(chars[2], 'w' | 'x' | 'y')
    {
        return format!("{stem}e");
    }
    stem.to_owned()
}

fn strip_suffixes(word: &str) -> String {
    let len = word.chars().count();

    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if len > 4 && word.ends_with("ied") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "ches", "shes", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_owned();
        }
    }
    if len > 3
        && word.ends_with('s')
        && !["ss", "us", "is", "ous"].iter().any(|s| word.ends_with(s))
    {
        return word[..word.len() - 1].to_owned();
    }
    if len > 5 && word.ends_with("ing") {
        let stem = &word[..word.len() - 3];
        if has_vowel(stem) {
            return repair_stem(stem, true);
        }
    }
    if len > 4 && word.ends_with("ed") && !word.ends_with("eed") {
        let stem = &word[..word.len() - 2];
        if has_vowel(stem) {
            return repair_stem(stem, true);
        }
    }
    word.to_owned()
}

/// Dictionary-plus-suffix English lemmatizer.
#[derive(Debug, Clone)]
pub struct RuleLemmatizer {
    irregular: HashMap<&'static str, &'static str>,
}

impl RuleLemmatizer {
    /// Creates a lemmatizer with the built-in irregular form table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR_FORMS.iter().copied().collect(),
        }
    }

    /// Returns the base form of a single word.
    #[must_use]
    pub fn lemma_of(&self, surface: &str) -> String {
        let lower = surface.to_lowercase();
        if let Some(base) = self.irregular.get(lower.as_str()) {
            return (*base).to_owned();
        }
        strip_suffixes(&lower)
    }
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, text: &str) -> Result<Vec<Token>, LemmatizeError> {
        if let Some(c) = text.chars().find(|c| c.is_control()) {
            return Err(LemmatizeError::ControlCharacter(u32::from(c)));
        }

        Ok(text
            .split(|c: char| !c.is_alphabetic())
            .filter(|s| !s.is_empty())
            .map(|surface| Token {
                surface: surface.to_owned(),
                lemma: self.lemma_of(surface),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemmas(text: &str) -> Vec<String> {
        RuleLemmatizer::new()
            .lemmatize(text)
            .unwrap()
            .into_iter()
            .map(|t| t.lemma)
            .collect()
    }

    #[test]
    fn test_lemmatize_keeps_surface_and_lowercases_lemma() {
        let tokens = RuleLemmatizer::new().lemmatize("The cat ran.").unwrap();

        assert_eq!(
            tokens,
            vec![
                Token {
                    surface: "The".to_owned(),
                    lemma: "the".to_owned(),
                },
                Token {
                    surface: "cat".to_owned(),
                    lemma: "cat".to_owned(),
                },
                Token {
                    surface: "ran".to_owned(),
                    lemma: "run".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_regular_inflections_are_reduced() {
        assert_eq!(
            lemmas("cats running stopped stories boxes hoped walked"),
            vec!["cat", "run", "stop", "story", "box", "hope", "walk"]
        );
    }

    #[test]
    fn test_words_that_only_look_inflected_are_kept() {
        assert_eq!(
            lemmas("this bus glass string need"),
            vec!["this", "bus", "glass", "string", "need"]
        );
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        let tokens = RuleLemmatizer::new().lemmatize("Cat,dog!  bird").unwrap();

        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["Cat", "dog", "bird"]);
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let result = RuleLemmatizer::new().lemmatize("cat\u{0}dog");

        assert_eq!(result, Err(LemmatizeError::ControlCharacter(0)));
    }
}
