//! Application layer for the Play loop context.

pub mod command_handlers;
