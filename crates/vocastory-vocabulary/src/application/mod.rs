//! Application services for the Word Catalog context.

pub mod command_handlers;
pub mod query_handlers;
