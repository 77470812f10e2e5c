//! Vocastory: Word Catalog bounded context.
//!
//! Responsible for canonical word forms and the vocabulary sets that stories
//! are written against: creating and importing sets, starring them, and
//! deleting them.

pub mod application;
pub mod domain;
