//! In-memory event store.
//!
//! Keeps one ordered vector of stored events per aggregate stream behind a
//! read-write lock. The version check and the append happen under a single
//! write lock, so concurrent writers against the same stream serialize and
//! exactly one of two conflicting appends succeeds.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use inkstone_core::error::DomainError;
use inkstone_core::event::StoredEvent;
use inkstone_core::store::EventStore;

/// Thread-safe in-memory implementation of [`EventStore`].
#[derive(Clone, Default)]
pub struct MemoryEventStore {
    streams: Arc<RwLock<HashMap<Uuid, Vec<StoredEvent>>>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> i64 {
        stream.last().map_or(0, |event| event.sequence_number)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn load_stream(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))?;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
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

        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))?;
        let stream = streams.entry(aggregate_id).or_default();

        let actual = Self::current_version(stream);
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

        stream.extend_from_slice(events);
        tracing::debug!(
            %aggregate_id,
            events = events.len(),
            version = Self::current_version(stream),
            "events appended to stream"
        );
        Ok(())
    }
}
