//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use vocastory_core::error::DomainError;
use vocastory_core::repository::{EventRepository, StoredEvent};

/// Row shape of the `domain_events` table.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    sequence_number: i64,
    correlation_id: Uuid,
    causation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_id: row.aggregate_id,
            event_type: row.event_type,
            payload: row.payload,
            sequence_number: row.sequence_number,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            occurred_at: row.occurred_at,
        }
    }
}

fn infrastructure(context: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("{context}: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"
            SELECT event_id, aggregate_id, event_type, payload, sequence_number,
                   correlation_id, causation_id, occurred_at
            FROM domain_events
            WHERE aggregate_id = $1
            ORDER BY sequence_number
            ",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load events", &e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infrastructure("failed to begin transaction", &e))?;

        let actual: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(sequence_number) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| infrastructure("failed to read stream version", &e))?;
        let actual = actual.unwrap_or(0);

        if actual != expected_version {
            warn!(%aggregate_id, expected_version, actual, "stale expected version");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(
                r"
                INSERT INTO domain_events
                    (event_id, aggregate_id, event_type, payload, sequence_number,
                     correlation_id, causation_id, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                if is_unique_violation(&err) {
                    // A concurrent writer committed between our version read and insert.
                    warn!(%aggregate_id, expected_version, "sequence number already taken");
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual: event.sequence_number,
                    });
                }
                return Err(infrastructure("failed to insert event", &err));
            }
        }

        tx.commit()
            .await
            .map_err(|e| infrastructure("failed to commit events", &e))?;

        debug!(%aggregate_id, count = events.len(), "appended events");
        Ok(())
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar::<_, Uuid>(
            r"
            SELECT aggregate_id
            FROM domain_events
            WHERE event_type = $1
            GROUP BY aggregate_id
            ORDER BY MIN(global_position)
            ",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to list aggregates", &e))
    }
}
