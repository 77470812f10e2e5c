//! Route for the Play loop bounded context.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use vocastory_play::application::command_handlers::{self, PlayDirective};
use vocastory_play::domain::commands;

use super::log_command;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    /// Word sets to play in; every live set when empty.
    #[serde(default)]
    pub word_set_ids: Vec<Uuid>,
}

/// POST /
#[instrument(skip(state, request), fields(user_id = %user.0))]
async fn play(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<PlayRequest>,
) -> Result<Json<PlayDirective>, ApiError> {
    let command = commands::Play {
        correlation_id: Uuid::new_v4(),
        user_id: user.0,
        word_set_ids: request.word_set_ids,
    };

    log_command(&command);

    let directive = command_handlers::handle_play(
        &command,
        &state.routing,
        &*state.rng,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(directive))
}

/// Returns the router for the play loop.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(play))
}
