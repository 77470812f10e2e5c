//! Shared application state.

use std::sync::{Arc, Mutex};

use sqlx::PgPool;
use vocastory_core::clock::Clock;
use vocastory_core::repository::EventRepository;
use vocastory_core::rng::DeterministicRng;
use vocastory_play::domain::routing::RoutingConfig;
use vocastory_story::domain::lemmatizer::RuleLemmatizer;
use vocastory_story::domain::policy::ClosingPolicy;
use vocastory_story::domain::validator::ContributionValidator;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// `PostgreSQL` connection pool.
    pub db_pool: PgPool,
    /// Clock used for timestamps and round timeouts.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG used by the play loop.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Event store.
    pub event_repository: Arc<dyn EventRepository>,
    /// Contribution validator with its lemmatizer.
    pub validator: Arc<ContributionValidator>,
    /// Round closing thresholds.
    pub closing_policy: ClosingPolicy,
    /// Play loop weights.
    pub routing: RoutingConfig,
}

impl AppState {
    /// Create new application state with the rule-based lemmatizer and
    /// default round and play settings.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        event_repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            db_pool,
            clock,
            rng,
            event_repository,
            validator: Arc::new(ContributionValidator::new(Arc::new(RuleLemmatizer::new()))),
            closing_policy: ClosingPolicy::default(),
            routing: RoutingConfig::default(),
        }
    }

    /// Replaces the round closing thresholds.
    #[must_use]
    pub fn with_closing_policy(mut self, closing_policy: ClosingPolicy) -> Self {
        self.closing_policy = closing_policy;
        self
    }

    /// Replaces the play loop weights.
    #[must_use]
    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }
}
