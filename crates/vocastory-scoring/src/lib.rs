//! Vocastory: Scoring bounded context.
//!
//! Derives user scores, story quality rankings, and activity timelines from
//! the word set and story streams. Nothing is cached: every query recomputes
//! from the current state.

pub mod application;
pub mod domain;
