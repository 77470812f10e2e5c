//! Vocastory: Play loop bounded context.
//!
//! Routes an active participant to a story they can read, write in, or
//! review, starting a new story when nothing is writable.

pub mod application;
pub mod domain;
