//! Routes for the Story Rounds bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use vocastory_story::application::command_handlers;
use vocastory_story::application::query_handlers::{
    self, CandidateView, StoryEligibility, StoryView,
};
use vocastory_story::domain::commands;

use super::{CommandResponse, StarResponse, event_ids, log_command};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct StartStoryRequest {
    /// The word set the story draws its vocabulary from.
    pub word_set_id: Uuid,
    /// Optional title; defaults to the word set title with a counter.
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for POST /{story_id}/contributions.
#[derive(Debug, Deserialize)]
pub struct SubmitContributionRequest {
    /// The round the sentence is written for.
    pub round_index: u32,
    /// The sentence.
    pub text: String,
}

/// Request body for POST /{story_id}/votes.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    /// The candidate voted for.
    pub contribution_id: Uuid,
}

/// Request body for PUT /{story_id}/review.
#[derive(Debug, Deserialize)]
pub struct ReviewStoryRequest {
    /// Report flag.
    #[serde(default)]
    pub flag: bool,
    /// Coherence rating, 1 to 10.
    pub coherence: i64,
    /// Creativity rating, 1 to 10.
    pub creativity: i64,
    /// Fun rating, 1 to 10.
    pub fun: i64,
    /// Free-text comment.
    #[serde(default)]
    pub comment: String,
}

/// Response body for POST /{story_id}/contributions.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    /// The accepted contribution.
    pub contribution_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body for POST /{story_id}/votes.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    /// Whether the vote was new.
    pub recorded: bool,
    /// The contribution selected because this vote closed the round.
    pub selected_contribution_id: Option<Uuid>,
    /// Whether this vote completed the story.
    pub completed: bool,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// POST /
#[instrument(skip(state, request), fields(word_set_id = %request.word_set_id))]
async fn start_story(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<StartStoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::StartStory {
        correlation_id: Uuid::new_v4(),
        word_set_id: request.word_set_id,
        title: request.title,
    };

    log_command(&command);

    let result = command_handlers::handle_start_story(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        aggregate_id: result.aggregate_id,
        event_ids: event_ids(&result.stored_events),
    }))
}

/// GET /{story_id}
#[instrument(skip(state))]
async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    let view = query_handlers::get_story_by_id(story_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /{story_id}/candidates
#[instrument(skip(state), fields(user_id = %user.0))]
async fn list_candidates(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CandidateView>>, ApiError> {
    let candidates =
        query_handlers::list_candidates(story_id, user.0, &*state.event_repository).await?;
    Ok(Json(candidates))
}

/// GET /{story_id}/eligibility
#[instrument(skip(state), fields(user_id = %user.0))]
async fn get_eligibility(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<StoryEligibility>, ApiError> {
    let eligibility =
        query_handlers::get_story_eligibility(story_id, user.0, &*state.event_repository)
            .await?;
    Ok(Json(eligibility))
}

/// POST /{story_id}/contributions
#[instrument(skip(state, request), fields(user_id = %user.0, round_index = request.round_index))]
async fn submit_contribution(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<SubmitContributionRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let command = commands::SubmitContribution {
        correlation_id: Uuid::new_v4(),
        story_id,
        author_id: user.0,
        round_index: request.round_index,
        text: request.text,
    };

    log_command(&command);

    let accepted = command_handlers::handle_submit_contribution(
        &command,
        &state.validator,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(SubmissionResponse {
        contribution_id: accepted.contribution_id,
        event_ids: event_ids(&accepted.stored_events),
    }))
}

/// POST /{story_id}/votes
#[instrument(
    skip(state, request),
    fields(user_id = %user.0, contribution_id = %request.contribution_id)
)]
async fn cast_vote(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<CastVoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let command = commands::CastVote {
        correlation_id: Uuid::new_v4(),
        story_id,
        voter_id: user.0,
        contribution_id: request.contribution_id,
    };

    log_command(&command);

    let outcome = command_handlers::handle_cast_vote(
        &command,
        &state.closing_policy,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(VoteResponse {
        recorded: outcome.recorded,
        selected_contribution_id: outcome.selected_contribution_id,
        completed: outcome.completed,
        event_ids: event_ids(&outcome.stored_events),
    }))
}

/// PUT /{story_id}/review
#[instrument(skip(state, request), fields(user_id = %user.0))]
async fn review_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<ReviewStoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ReviewStory {
        correlation_id: Uuid::new_v4(),
        story_id,
        reviewer_id: user.0,
        flag: request.flag,
        coherence: request.coherence,
        creativity: request.creativity,
        fun: request.fun,
        comment: request.comment,
    };

    log_command(&command);

    let result = command_handlers::handle_review_story(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        aggregate_id: result.aggregate_id,
        event_ids: event_ids(&result.stored_events),
    }))
}

/// POST /{story_id}/star
#[instrument(skip(state), fields(user_id = %user.0))]
async fn toggle_star(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<StarResponse>, ApiError> {
    let command = commands::ToggleStoryStar {
        correlation_id: Uuid::new_v4(),
        story_id,
        user_id: user.0,
    };

    log_command(&command);

    let toggled = command_handlers::handle_toggle_story_star(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(StarResponse {
        starred: toggled.starred,
        event_ids: event_ids(&toggled.stored_events),
    }))
}

/// Returns the router for the story rounds context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_story))
        .route("/{story_id}", get(get_story))
        .route("/{story_id}/candidates", get(list_candidates))
        .route("/{story_id}/eligibility", get(get_eligibility))
        .route("/{story_id}/contributions", post(submit_contribution))
        .route("/{story_id}/votes", post(cast_vote))
        .route("/{story_id}/review", put(review_story))
        .route("/{story_id}/star", post(toggle_star))
}
