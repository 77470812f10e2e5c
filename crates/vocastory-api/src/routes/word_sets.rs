//! Routes for the Word Catalog bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use vocastory_story::application::command_handlers as story_handlers;
use vocastory_story::application::query_handlers::{StorySummary, list_stories_by_word_set};
use vocastory_vocabulary::application::command_handlers;
use vocastory_vocabulary::application::query_handlers::{
    self, WordSetSummary, WordSetView,
};
use vocastory_vocabulary::domain::commands;

use super::{CommandResponse, StarResponse, event_ids, log_command};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateWordSetRequest {
    /// Display title.
    pub title: String,
    /// Raw words.
    pub words: Vec<String>,
}

/// Request body for POST /import.
#[derive(Debug, Deserialize)]
pub struct ImportWordSetRequest {
    /// Markdown word list.
    pub source: String,
}

/// Response body for DELETE /{word_set_id}.
#[derive(Debug, Serialize)]
pub struct DeleteWordSetResponse {
    /// The deleted word set.
    pub word_set_id: Uuid,
    /// Stories discarded with it.
    pub discarded_story_ids: Vec<Uuid>,
}

/// POST /
#[instrument(skip(state, request), fields(user_id = %user.0))]
async fn create_word_set(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateWordSetRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateWordSet {
        correlation_id: Uuid::new_v4(),
        title: request.title,
        creator_id: user.0,
        words: request.words,
    };

    log_command(&command);

    let result = command_handlers::handle_create_word_set(
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

/// POST /import
#[instrument(skip(state, request), fields(user_id = %user.0))]
async fn import_word_set(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ImportWordSetRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ImportWordSet {
        correlation_id: Uuid::new_v4(),
        creator_id: user.0,
        source: request.source,
    };

    log_command(&command);

    let result = command_handlers::handle_import_word_set(
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

/// GET /
#[instrument(skip(state))]
async fn list_word_sets(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<Json<Vec<WordSetSummary>>, ApiError> {
    let word_sets =
        query_handlers::list_word_sets(user.map(|u| u.0), &*state.event_repository).await?;
    Ok(Json(word_sets))
}

/// GET /{word_set_id}
#[instrument(skip(state))]
async fn get_word_set(
    State(state): State<AppState>,
    Path(word_set_id): Path<Uuid>,
    user: Option<AuthenticatedUser>,
) -> Result<Json<WordSetView>, ApiError> {
    let view = query_handlers::get_word_set_by_id(
        word_set_id,
        user.map(|u| u.0),
        &*state.event_repository,
    )
    .await?;
    Ok(Json(view))
}

/// GET /{word_set_id}/stories
#[instrument(skip(state))]
async fn list_stories(
    State(state): State<AppState>,
    Path(word_set_id): Path<Uuid>,
) -> Result<Json<Vec<StorySummary>>, ApiError> {
    let stories = list_stories_by_word_set(word_set_id, &*state.event_repository).await?;
    Ok(Json(stories))
}

/// POST /{word_set_id}/star
#[instrument(skip(state), fields(user_id = %user.0))]
async fn toggle_star(
    State(state): State<AppState>,
    Path(word_set_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<StarResponse>, ApiError> {
    let command = commands::ToggleWordSetStar {
        correlation_id: Uuid::new_v4(),
        word_set_id,
        user_id: user.0,
    };

    log_command(&command);

    let toggled = command_handlers::handle_toggle_word_set_star(
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

/// DELETE /{word_set_id}
#[instrument(skip(state), fields(user_id = %user.0))]
async fn delete_word_set(
    State(state): State<AppState>,
    Path(word_set_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<DeleteWordSetResponse>, ApiError> {
    let command = commands::DeleteWordSet {
        correlation_id: Uuid::new_v4(),
        word_set_id,
    };

    log_command(&command);

    let deleted = story_handlers::handle_delete_word_set(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(DeleteWordSetResponse {
        word_set_id: deleted.word_set_id,
        discarded_story_ids: deleted.discarded_story_ids,
    }))
}

/// Returns the router for the word catalog context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_word_set).get(list_word_sets))
        .route("/import", post(import_word_set))
        .route("/{word_set_id}", get(get_word_set).delete(delete_word_set))
        .route("/{word_set_id}/stories", get(list_stories))
        .route("/{word_set_id}/star", post(toggle_star))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use vocastory_test_support::{FailingEventRepository, InMemoryEventRepository};

    use super::*;
    use crate::routes::test_helpers::{app_state_with, send};

    fn in_memory_app() -> Router {
        router().with_state(app_state_with(Arc::new(InMemoryEventRepository::new())))
    }

    #[tokio::test]
    async fn test_create_then_get_word_set() {
        // Arrange
        let app = in_memory_app();
        let user = Uuid::new_v4();

        // Act
        let (status, created) = send(
            app.clone(),
            "POST",
            "/",
            Some(user),
            Some(json!({ "title": "Animals", "words": ["Cat", "run", "cat"] })),
        )
        .await;
        let id = created["aggregate_id"].as_str().unwrap().to_owned();
        let (get_status, view) = send(app, "GET", &format!("/{id}"), Some(user), None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["event_ids"].as_array().unwrap().len(), 1);
        assert_eq!(get_status, StatusCode::OK);
        assert_eq!(view["title"], "Animals");
        assert_eq!(view["words"].as_array().unwrap().len(), 2);
        assert_eq!(view["creator_id"], user.to_string());
    }

    #[tokio::test]
    async fn test_create_without_user_header_returns_401() {
        let (status, json) = send(
            in_memory_app(),
            "POST",
            "/",
            None,
            Some(json!({ "title": "Animals", "words": ["cat"] })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_create_with_no_words_returns_400() {
        let (status, json) = send(
            in_memory_app(),
            "POST",
            "/",
            Some(Uuid::new_v4()),
            Some(json!({ "title": "Empty", "words": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_import_markdown_word_list() {
        let source = "---\ntitle: Verbs\n---\n- run\n- jump\n";

        let (status, json) = send(
            in_memory_app(),
            "POST",
            "/import",
            Some(Uuid::new_v4()),
            Some(json!({ "source": source })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["aggregate_id"].is_string());
    }

    #[tokio::test]
    async fn test_star_toggles_and_list_reports_viewer_star() {
        let app = in_memory_app();
        let user = Uuid::new_v4();
        let (_, created) = send(
            app.clone(),
            "POST",
            "/",
            Some(user),
            Some(json!({ "title": "Animals", "words": ["cat"] })),
        )
        .await;
        let id = created["aggregate_id"].as_str().unwrap().to_owned();

        let (status, starred) =
            send(app.clone(), "POST", &format!("/{id}/star"), Some(user), None).await;
        let (_, listed) = send(app.clone(), "GET", "/", Some(user), None).await;
        let (_, unstarred) = send(app, "POST", &format!("/{id}/star"), Some(user), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(starred["starred"], true);
        assert_eq!(listed[0]["star_count"], 1);
        assert_eq!(listed[0]["starred_by_viewer"], true);
        assert_eq!(unstarred["starred"], false);
    }

    #[tokio::test]
    async fn test_delete_hides_word_set_from_listing() {
        let app = in_memory_app();
        let user = Uuid::new_v4();
        let (_, created) = send(
            app.clone(),
            "POST",
            "/",
            Some(user),
            Some(json!({ "title": "Animals", "words": ["cat"] })),
        )
        .await;
        let id = created["aggregate_id"].as_str().unwrap().to_owned();

        let (status, deleted) =
            send(app.clone(), "DELETE", &format!("/{id}"), Some(user), None).await;
        let (_, listed) = send(app, "GET", "/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["word_set_id"], id);
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_word_set_returns_404() {
        let (status, json) = send(
            in_memory_app(),
            "GET",
            &format!("/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_list_returns_500_when_repository_fails() {
        let app = router().with_state(app_state_with(Arc::new(FailingEventRepository)));

        let (status, json) = send(app, "GET", "/", None, None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
