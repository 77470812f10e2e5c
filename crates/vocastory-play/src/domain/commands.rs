//! Commands for the Play loop context.

use uuid::Uuid;
use vocastory_core::command::Command;

/// Asks where `user_id` should go next.
#[derive(Debug, Clone)]
pub struct Play {
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The participant being routed.
    pub user_id: Uuid,
    /// Word sets to play in; empty means every live word set.
    pub word_set_ids: Vec<Uuid>,
}

impl Command for Play {
    fn command_type(&self) -> &'static str {
        "play.route"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
