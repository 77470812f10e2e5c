//! PostgreSQL event store for Vocastory.
//!
//! Every word set and story is an event stream in the `domain_events` table.
//! The `(aggregate_id, sequence_number)` unique constraint is what serializes
//! concurrent writers on a story's round state.

pub mod pg_event_repository;
