//! Application services for the Story Rounds context.

pub mod command_handlers;
pub mod query_handlers;
