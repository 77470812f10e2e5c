//! Shared test mocks and utilities for the Vocastory storytelling engine.

mod clock;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
pub use rng::{MockRng, SequenceRng};
