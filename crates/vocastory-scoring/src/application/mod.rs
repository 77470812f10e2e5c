//! Application services for the Scoring context.

pub mod query_handlers;
