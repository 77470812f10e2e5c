//! Domain model for the Story Rounds context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod lemmatizer;
pub mod policy;
pub mod validator;
