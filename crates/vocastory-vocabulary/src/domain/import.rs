//! Markdown word-list import.
//!
//! A word list is a markdown document whose list items are the words. The
//! title comes from YAML front matter (`title:`) when present, otherwise from
//! the first heading. An item may carry a gloss after a colon
//! (`- cat: a small feline`); only the part before the colon is the word.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use vocastory_core::error::DomainError;

/// A parsed word-list document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListDocument {
    /// The document title.
    pub title: String,
    /// Raw words in document order.
    pub words: Vec<String>,
    /// Lowercase hex SHA-256 of the full source.
    pub source_hash: String,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    #[serde(default)]
    words: Vec<String>,
}

/// Splits YAML front matter delimited by `---` lines from the markdown body.
fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), DomainError> {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return Ok((FrontMatter::default(), source));
    };

    let Some(end) = rest.find("\n---") else {
        return Err(DomainError::Validation(
            "front matter is not terminated by a --- line".to_owned(),
        ));
    };
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("invalid front matter: {e}")))?
    };
    Ok((front_matter, body))
}

fn word_from_item(item: &str) -> Option<String> {
    let word = item.split(':').next().unwrap_or_default().trim();
    (!word.is_empty()).then(|| word.to_owned())
}

/// Computes the lowercase hex SHA-256 digest of `source`.
#[must_use]
pub fn source_hash(source: &str) -> String {
    Sha256::digest(source.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Parses a markdown word list.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the front matter is malformed or the
/// document has no title.
pub fn parse_word_list_document(source: &str) -> Result<WordListDocument, DomainError> {
    let (front_matter, body) = split_front_matter(source)?;

    let mut heading: Option<String> = None;
    let mut in_heading = false;
    let mut items: Vec<String> = Vec::new();
    let mut open_items: Vec<String> = Vec::new();

    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Heading { .. }) if heading.is_none() => {
                in_heading = true;
                heading = Some(String::new());
            }
            Event::End(TagEnd::Heading(_)) => in_heading = false,
            Event::Start(Tag::Item) => open_items.push(String::new()),
            Event::End(TagEnd::Item) => {
                if let Some(item) = open_items.pop() {
                    items.extend(word_from_item(&item));
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(item) = open_items.last_mut() {
                    item.push_str(&text);
                } else if in_heading {
                    if let Some(h) = heading.as_mut() {
                        h.push_str(&text);
                    }
                }
            }
            _ => {}
        }
    }

    let title = front_matter
        .title
        .or(heading)
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            DomainError::Validation(
                "word list needs a title (front matter or heading)".to_owned(),
            )
        })?;

    let mut words = front_matter.words;
    words.extend(items);

    Ok(WordListDocument {
        title,
        words,
        source_hash: source_hash(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_list_items_become_title_and_words() {
        let source = "# Farm animals\n\n- cow\n- Sheep\n- goat: climbs everything\n";

        let doc = parse_word_list_document(source).unwrap();

        assert_eq!(doc.title, "Farm animals");
        assert_eq!(doc.words, vec!["cow", "Sheep", "goat"]);
    }

    #[test]
    fn test_front_matter_title_wins_over_heading() {
        let source =
            "---\ntitle: Verbs of motion\nwords: [run]\n---\n# Ignored\n\n* walk\n* swim\n";

        let doc = parse_word_list_document(source).unwrap();

        assert_eq!(doc.title, "Verbs of motion");
        assert_eq!(doc.words, vec!["run", "walk", "swim"]);
    }

    #[test]
    fn test_inline_code_items_are_kept() {
        let doc = parse_word_list_document("# Code\n\n- `borrow`\n").unwrap();

        assert_eq!(doc.words, vec!["borrow"]);
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let result = parse_word_list_document("- cow\n- goat\n");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_unterminated_front_matter_is_rejected() {
        let result = parse_word_list_document("---\ntitle: Broken\n- cow\n");

        match result {
            Err(DomainError::Validation(msg)) => {
                assert_eq!(msg, "front matter is not terminated by a --- line");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_source_hash_is_stable_hex_sha256() {
        let hash = source_hash("abc");

        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
