//! Vocastory: Story Rounds bounded context.
//!
//! Responsible for the per-story round lifecycle: validating contributions
//! against the story's vocabulary, recording candidates and votes, closing
//! rounds, completing stories, and collecting reviews.

pub mod application;
pub mod domain;
