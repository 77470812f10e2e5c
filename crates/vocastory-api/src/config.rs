//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use vocastory_play::domain::routing::RoutingConfig;
use vocastory_story::domain::policy::ClosingPolicy;

use crate::error::AppError;

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound of the connection pool.
    pub database_max_connections: u32,
    /// Round closing thresholds.
    pub closing_policy: ClosingPolicy,
    /// Play loop weights.
    pub routing: RoutingConfig,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_owned()))?;

        let defaults = ClosingPolicy::default();
        let closing_policy = ClosingPolicy {
            long_timeout: Duration::seconds(parse_or(
                &lookup,
                "ROUND_LONG_TIMEOUT_SECS",
                defaults.long_timeout.num_seconds(),
            )?),
            short_timeout: Duration::seconds(parse_or(
                &lookup,
                "ROUND_SHORT_TIMEOUT_SECS",
                defaults.short_timeout.num_seconds(),
            )?),
            high_votes: parse_or(&lookup, "ROUND_HIGH_VOTES", defaults.high_votes)?,
            low_votes: parse_or(&lookup, "ROUND_LOW_VOTES", defaults.low_votes)?,
        };

        let defaults = RoutingConfig::default();
        let routing = RoutingConfig {
            read_weight: parse_or(&lookup, "PLAY_READ_WEIGHT", defaults.read_weight)?,
            write_weight: parse_or(&lookup, "PLAY_WRITE_WEIGHT", defaults.write_weight)?,
            review_weight: parse_or(&lookup, "PLAY_REVIEW_WEIGHT", defaults.review_weight)?,
            max_attempts: parse_or(&lookup, "PLAY_MAX_ATTEMPTS", defaults.max_attempts)?,
        };
        routing
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 3000)?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            closing_policy,
            routing,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
    }
}
