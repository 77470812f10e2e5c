//! Integration tests for the play loop.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use vocastory_story::domain::policy::ClosingPolicy;
use vocastory_test_support::SequenceRng;

#[sqlx::test(migrations = "../../migrations")]
async fn test_play_on_empty_pool_creates_a_story_to_write(pool: PgPool) {
    // Arrange: a draw of 0.5 lands in the write band; index 0 picks the only set.
    let rng = SequenceRng::new(vec![0]).with_floats(vec![0.5]);
    let app = common::build_test_app_with(pool, ClosingPolicy::default(), rng);
    let word_set_id =
        common::create_word_set(app.clone(), Uuid::new_v4(), "Forest", &["tree"]).await;

    // Act
    let (status, directive) = common::post_json(
        app.clone(),
        "/api/v1/play",
        Uuid::new_v4(),
        &json!({ "word_set_ids": [word_set_id] }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK, "{directive}");
    assert_eq!(directive["mode"], "write");
    assert_eq!(directive["created"], true);
    let story_id = directive["story_id"].as_str().unwrap();
    let (_, story) = common::get_json(app, &format!("/api/v1/stories/{story_id}")).await;
    assert_eq!(story["title"], "Forest #1");
    assert_eq!(story["word_set_id"], word_set_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_play_with_no_word_sets_has_nothing_available(pool: PgPool) {
    let rng = SequenceRng::new(vec![]).with_floats(vec![0.5; 25]);
    let app = common::build_test_app_with(pool, ClosingPolicy::default(), rng);

    let (status, directive) =
        common::post_json(app, "/api/v1/play", Uuid::new_v4(), &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(directive["mode"], "nothing_available");
}
