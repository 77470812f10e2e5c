//! Domain layer for the Play loop context.

pub mod commands;
pub mod routing;
