//! Word catalog lookups. Contribution markup links here.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use tracing::instrument;
use uuid::Uuid;

use vocastory_vocabulary::application::query_handlers::{self, WordView};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /{word_id}
#[instrument(skip(state))]
async fn get_word(
    State(state): State<AppState>,
    Path(word_id): Path<Uuid>,
) -> Result<Json<WordView>, ApiError> {
    let view = query_handlers::get_word_by_id(word_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// Returns the router for word lookups.
pub fn router() -> Router<AppState> {
    Router::new().route("/{word_id}", get(get_word))
}
