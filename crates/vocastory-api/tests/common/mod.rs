//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;
use vocastory_core::clock::Clock;
use vocastory_core::rng::DeterministicRng;
use vocastory_event_store::pg_event_repository::PgEventRepository;
use vocastory_story::domain::policy::ClosingPolicy;
use vocastory_test_support::{FixedClock, SequenceRng};

use vocastory_api::auth::USER_ID_HEADER;
use vocastory_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock::at_default())
}

/// Build the full app router with a real `PgEventRepository` and deterministic
/// Clock/RNG, using default round and play settings.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, ClosingPolicy::default(), SequenceRng::new(vec![]))
}

/// Build the full app router with custom round thresholds and a scripted RNG
/// for tests that drive round closing or the play loop.
pub fn build_test_app_with(
    pool: PgPool,
    closing_policy: ClosingPolicy,
    rng: SequenceRng,
) -> Router {
    let clock = fixed_clock();
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let event_repository = Arc::new(PgEventRepository::new(pool.clone()));
    let app_state =
        AppState::new(pool, clock, rng, event_repository).with_closing_policy(closing_policy);

    vocastory_api::app(app_state)
}

/// Send a request, optionally as `user` and with a JSON body, and return the
/// status with the JSON response.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body as `user`.
pub async fn post_json(
    app: Router,
    uri: &str,
    user: Uuid,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(user), Some(body)).await
}

/// Send an anonymous GET request.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}

/// Create a word set as `creator` and return its id.
pub async fn create_word_set(app: Router, creator: Uuid, title: &str, words: &[&str]) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/word-sets",
        creator,
        &serde_json::json!({ "title": title, "words": words }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json["aggregate_id"].as_str().unwrap().to_owned()
}

/// Start a story over `word_set_id` and return its id.
pub async fn start_story(app: Router, word_set_id: &str) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/stories",
        Uuid::new_v4(),
        &serde_json::json!({ "word_set_id": word_set_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json["aggregate_id"].as_str().unwrap().to_owned()
}
