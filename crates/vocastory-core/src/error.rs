//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every failure crossing a bounded-context boundary is one of these typed
/// outcomes; callers decide how to present them.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate (word set, story) was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// An entity inside an aggregate (contribution, word) was not found.
    #[error("{entity} not found: {id}")]
    EntityNotFound {
        /// The kind of entity, e.g. `"contribution"`.
        entity: &'static str,
        /// The missing identifier.
        id: Uuid,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// Input rejected by domain validation; nothing was persisted.
    #[error("validation error: {0}")]
    Validation(String),

    /// The aggregate is in a state that does not permit the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for `ConcurrencyConflict`.
    #[must_use]
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
