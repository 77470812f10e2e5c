//! Vocastory: HTTP API.
//!
//! Exposes the word catalog, story rounds, scoring, and play loop over
//! axum. [`app`] builds the complete router; the binary adds configuration
//! and telemetry around it.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router with every context mounted under
/// `/api/v1`.
pub fn app(app_state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/word-sets", routes::word_sets::router())
        .nest("/api/v1/words", routes::words::router())
        .nest("/api/v1/stories", routes::stories::router())
        .nest("/api/v1/play", routes::play::router())
        .nest("/api/v1/me", routes::me::router())
        .nest("/api/v1", routes::scoring::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
