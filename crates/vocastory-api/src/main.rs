//! Vocastory API server entry point.

use std::sync::{Arc, Mutex};

use sqlx::postgres::PgPoolOptions;
use vocastory_api::config::AppConfig;
use vocastory_api::error::AppError;
use vocastory_api::state::AppState;
use vocastory_api::{app, telemetry};
use vocastory_core::clock::{Clock, SystemClock};
use vocastory_core::rng::{DeterministicRng, StdDeterministicRng};
use vocastory_event_store::pg_event_repository::PgEventRepository;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Vocastory API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // Build application state.
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> =
        Arc::new(Mutex::new(StdDeterministicRng::from_os_rng()));
    let event_repository = Arc::new(PgEventRepository::new(pool.clone()));
    let app_state = AppState::new(pool, clock, rng, event_repository)
        .with_closing_policy(config.closing_policy)
        .with_routing(config.routing.clone());

    // Start server.
    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;

    telemetry.shutdown();
    Ok(())
}
