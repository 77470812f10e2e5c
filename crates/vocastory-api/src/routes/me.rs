//! Routes scoped to the calling user.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use tracing::instrument;

use vocastory_scoring::application::query_handlers::get_user_score;
use vocastory_scoring::domain::engine::UserScore;
use vocastory_story::application::query_handlers::{StorySummary, list_stories_by_author};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /score
#[instrument(skip(state), fields(user_id = %user.0))]
async fn my_score(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserScore>, ApiError> {
    let score = get_user_score(user.0, &*state.event_repository).await?;
    Ok(Json(score))
}

/// GET /stories
#[instrument(skip(state), fields(user_id = %user.0))]
async fn my_stories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<StorySummary>>, ApiError> {
    let stories = list_stories_by_author(user.0, &*state.event_repository).await?;
    Ok(Json(stories))
}

/// Returns the router for the calling user's data.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/score", get(my_score))
        .route("/stories", get(my_stories))
}
