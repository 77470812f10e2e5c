//! Route modules organized by bounded context.

pub mod health;
pub mod me;
pub mod play;
pub mod scoring;
pub mod stories;
pub mod word_sets;
pub mod words;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use vocastory_core::command::Command;
use vocastory_core::repository::StoredEvent;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate the command acted on.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body of the star toggles.
#[derive(Debug, Serialize)]
pub struct StarResponse {
    /// Whether the caller stars the aggregate after the toggle.
    pub starred: bool,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

pub(crate) fn log_command(command: &dyn Command) {
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        "handling command"
    );
}

pub(crate) fn event_ids(stored_events: &[StoredEvent]) -> Vec<Uuid> {
    stored_events.iter().map(|e| e.event_id).collect()
}
