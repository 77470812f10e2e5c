//! Pure scoring model.

pub mod engine;
pub mod rows;
pub mod timeline;
