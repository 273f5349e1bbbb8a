//! `PostgreSQL` implementation of the [`EventStore`] trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use inkstone_core::error::DomainError;
use inkstone_core::event::StoredEvent;
use inkstone_core::store::EventStore;

/// PostgreSQL-backed event store.
///
/// The append path checks the stream's max sequence number inside a
/// transaction; the `UNIQUE (aggregate_id, sequence_number)` constraint is
/// the backstop for writers racing between the check and the insert, and a
/// unique violation is reported as a concurrency conflict.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn stream_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(infrastructure)
    }
}

fn infrastructure(error: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn row_to_event(row: &PgRow) -> Result<StoredEvent, DomainError> {
    let attributes: serde_json::Value = row.try_get("attributes").map_err(infrastructure)?;
    let attributes: BTreeMap<String, String> = serde_json::from_value(attributes)
        .map_err(|e| DomainError::Deserialization(format!("invalid event attributes: {e}")))?;
    Ok(StoredEvent {
        event_id: row.try_get("event_id").map_err(infrastructure)?,
        aggregate_id: row.try_get("aggregate_id").map_err(infrastructure)?,
        event_type: row.try_get("event_type").map_err(infrastructure)?,
        event_version: row.try_get("event_version").map_err(infrastructure)?,
        payload: row.try_get("payload").map_err(infrastructure)?,
        sequence_number: row.try_get("sequence_number").map_err(infrastructure)?,
        attributes,
        occurred_at: row.try_get("occurred_at").map_err(infrastructure)?,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn load_stream(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            "SELECT event_id, aggregate_id, event_type, event_version, payload, \
             sequence_number, attributes, occurred_at \
             FROM domain_events WHERE aggregate_id = $1 ORDER BY sequence_number",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter().map(row_to_event).collect()
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;

        if actual != expected_version {
            tracing::debug!(
                %aggregate_id,
                expected = expected_version,
                actual,
                "version mismatch, rejecting append"
            );
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let attributes = serde_json::to_value(&event.attributes)
                .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
            let insert = sqlx::query(
                "INSERT INTO domain_events \
                 (event_id, aggregate_id, event_type, event_version, payload, \
                  sequence_number, attributes, occurred_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(event.event_version)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(attributes)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(error) = insert {
                if is_unique_violation(&error) {
                    drop(tx);
                    let actual = self
                        .stream_version(aggregate_id)
                        .await
                        .unwrap_or(expected_version);
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                return Err(infrastructure(error));
            }
        }

        let commit = tx.commit().await;
        if let Err(error) = commit {
            if is_unique_violation(&error) {
                let actual = self
                    .stream_version(aggregate_id)
                    .await
                    .unwrap_or(expected_version);
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    expected: expected_version,
                    actual,
                });
            }
            return Err(infrastructure(error));
        }

        tracing::debug!(
            %aggregate_id,
            events = events.len(),
            "events appended to stream"
        );
        Ok(())
    }
}
