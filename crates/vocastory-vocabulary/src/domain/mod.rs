//! Domain model for the Word Catalog context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod import;
pub mod word;
