//! Vocastory Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that all bounded
//! contexts depend on: aggregates, events, commands, the event repository
//! seam, and the clock/RNG abstractions that keep round closing and play
//! routing deterministic under test. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
pub mod rng;
