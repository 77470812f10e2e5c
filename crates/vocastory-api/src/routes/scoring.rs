//! Routes for the Scoring bounded context.

use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use chrono::Duration;
use serde::Deserialize;
use tracing::instrument;
use vocastory_core::error::DomainError;

use vocastory_scoring::application::query_handlers;
use vocastory_scoring::domain::engine::{StoryScore, UserScore};
use vocastory_scoring::domain::timeline::{TimelinePoint, default_bucket};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /rankings/stories.
#[derive(Debug, Deserialize)]
pub struct TopStoriesQuery {
    /// Maximum number of stories to return.
    pub limit: Option<usize>,
}

/// Query string for the GET /analytics timelines.
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    /// Bucket width in hours; eight when omitted.
    pub bucket_hours: Option<i64>,
}

/// GET /leaderboard
#[instrument(skip(state))]
async fn leaderboard(State(state): State<AppState>) -> Result<Json<Vec<UserScore>>, ApiError> {
    let board = query_handlers::get_leaderboard(&*state.event_repository).await?;
    Ok(Json(board))
}

/// GET /rankings/stories
#[instrument(skip(state))]
async fn top_stories(
    State(state): State<AppState>,
    Query(query): Query<TopStoriesQuery>,
) -> Result<Json<Vec<StoryScore>>, ApiError> {
    let ranked = query_handlers::get_top_stories(query.limit, &*state.event_repository).await?;
    Ok(Json(ranked))
}

fn bucket_from(query: &TimelineQuery) -> Result<Duration, DomainError> {
    match query.bucket_hours {
        None => Ok(default_bucket()),
        Some(hours) => Duration::try_hours(hours)
            .ok_or_else(|| DomainError::Validation("bucket_hours is out of range".to_owned())),
    }
}

/// GET /analytics/contributions
#[instrument(skip(state))]
async fn contribution_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<Vec<TimelinePoint>>, ApiError> {
    let bucket = bucket_from(&query)?;
    let points = query_handlers::get_contribution_timeline(
        bucket,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;
    Ok(Json(points))
}

/// GET /analytics/users
#[instrument(skip(state))]
async fn user_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<Vec<TimelinePoint>>, ApiError> {
    let bucket = bucket_from(&query)?;
    let points =
        query_handlers::get_user_timeline(bucket, state.clock.as_ref(), &*state.event_repository)
            .await?;
    Ok(Json(points))
}

/// Returns the router for scoring queries, mounted at the API root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/rankings/stories", get(top_stories))
        .route("/analytics/contributions", get(contribution_timeline))
        .route("/analytics/users", get(user_timeline))
}
