//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from their event stream.
///
/// Word sets and stories are both aggregates: every state change is an
/// event appended to the aggregate's stream, and current state is the fold
/// of that stream.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the persisted version (number of stored events applied).
    fn version(&self) -> i64;

    /// Apply a stored event to mutate internal state (used during reconstitution).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Returns `true` when no stored event has been applied yet.
    fn is_new(&self) -> bool {
        self.version() == 0
    }
}
