//! Test repositories: mock `EventRepository` implementations for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;
use vocastory_core::error::DomainError;
use vocastory_core::repository::{EventRepository, StoredEvent};

fn distinct_aggregate_ids<'a>(
    events: impl Iterator<Item = &'a StoredEvent>,
    event_type: &str,
) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    events
        .filter(|e| e.event_type == event_type)
        .map(|e| e.aggregate_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// An event repository that records all `load_events` and `append_events`
/// calls. Returns the configured result from `load_events` on every call and
/// always succeeds on `append_events`.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    ///
    /// # Panics
    ///
    /// Panics if `load_result` is an `Err`; use `FailingEventRepository` for
    /// error scenarios.
    #[must_use]
    pub fn new(load_result: Result<Vec<StoredEvent>, DomainError>) -> Self {
        Self {
            load_result: Mutex::new(load_result.expect(
                "RecordingEventRepository::new does not accept Err; use FailingEventRepository",
            )),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all events that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        let events = self.load_result.lock().unwrap();
        Ok(distinct_aggregate_ids(events.iter(), event_type))
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn list_aggregate_ids(&self, _event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        Ok(vec![])
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_aggregate_ids(&self, _event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    streams: HashMap<Uuid, Vec<StoredEvent>>,
    log: Vec<StoredEvent>,
    forced_conflicts: usize,
}

/// A multi-stream event repository held in memory. Enforces expected versions
/// the way the PostgreSQL store does, so command handlers can be exercised
/// end to end across several aggregates.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    state: Mutex<InMemoryState>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` appends fail with `ConcurrencyConflict`
    /// without writing anything, as if another writer won the race.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_appends_with_conflict(&self, count: usize) {
        self.state.lock().unwrap().forced_conflicts = count;
    }

    /// Returns every stored event of one stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stream(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.state
            .lock()
            .unwrap()
            .streams
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the event types of one stream, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_types(&self, aggregate_id: Uuid) -> Vec<String> {
        self.stream(aggregate_id)
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream(aggregate_id))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let actual = state
            .streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |e| e.sequence_number);

        if state.forced_conflicts > 0 {
            state.forced_conflicts -= 1;
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: actual + 1,
            });
        }
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        state
            .streams
            .entry(aggregate_id)
            .or_default()
            .extend(events.iter().cloned());
        state.log.extend(events.iter().cloned());
        Ok(())
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(distinct_aggregate_ids(state.log.iter(), event_type))
    }
}
