//! Projection engine — the read side.
//!
//! Projections subscribe to committed domain events and update denormalized
//! read models. Handlers must be idempotent upserts keyed by a stable
//! business identifier, because the surrounding delivery layer is
//! at-least-once. A failure in one projection never prevents the others
//! from processing the same event, and never propagates back to the write
//! path — the triggering command has already committed.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DomainError;
use crate::event::StoredEvent;

/// Receives events after they have been committed to the store. The
/// aggregate repository hands committed events to this side channel.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers committed events, in commit order for a given aggregate.
    async fn publish(&self, events: &[StoredEvent]);
}

/// A projection updating one read model from the event types it declares.
#[async_trait]
pub trait ProjectionHandler: Send + Sync {
    /// Stable projection name for diagnostics and replay-based recovery.
    fn projection_name(&self) -> &'static str;

    /// The event type tokens this projection reacts to. Events outside this
    /// set are skipped without error.
    fn event_types(&self) -> &'static [&'static str];

    /// Applies one committed event to the read model. Must be safe to call
    /// twice with the same event.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the read-model write fails; the engine
    /// logs the failure and carries on with other projections.
    async fn apply(&self, event: &StoredEvent) -> Result<(), DomainError>;
}

/// Dispatches committed events to the registered projections.
#[derive(Default)]
pub struct ProjectionEngine {
    projections: Vec<std::sync::Arc<dyn ProjectionHandler>>,
}

impl ProjectionEngine {
    /// Creates an engine with no projections registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projection. Multiple projections may react to the same
    /// event type; each keeps its own failure domain.
    pub fn register(&mut self, projection: std::sync::Arc<dyn ProjectionHandler>) {
        self.projections.push(projection);
    }

    /// Applies committed events to every interested projection, preserving
    /// per-aggregate commit order. Handler failures are logged with the
    /// event id and projection name, then isolated.
    pub async fn publish(&self, events: &[StoredEvent]) {
        for event in events {
            for projection in &self.projections {
                if !projection
                    .event_types()
                    .contains(&event.event_type.as_str())
                {
                    continue;
                }
                tracing::debug!(
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    projection = projection.projection_name(),
                    "applying event to projection"
                );
                if let Err(error) = projection.apply(event).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        projection = projection.projection_name(),
                        %error,
                        "projection handler failed"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl EventSink for ProjectionEngine {
    async fn publish(&self, events: &[StoredEvent]) {
        Self::publish(self, events).await;
    }
}

/// Denormalized read-model storage, keyed by business identifier within a
/// named collection. No event-sourcing semantics on this side.
#[async_trait]
pub trait ReadModelStore: Send + Sync {
    /// Inserts or replaces a row.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the write fails.
    async fn upsert(&self, collection: &str, key: &str, row: Value) -> Result<(), DomainError>;

    /// Deletes a row; deleting a missing row is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the delete fails.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), DomainError>;

    /// Fetches a row, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the read fails.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, DomainError>;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn stored(event_type: &str) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            event_type: event_type.to_owned(),
            event_version: 1,
            payload: serde_json::json!({}),
            sequence_number: 1,
            attributes: BTreeMap::new(),
            occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    struct Recording {
        name: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProjectionHandler for Recording {
        fn projection_name(&self) -> &'static str {
            self.name
        }

        fn event_types(&self) -> &'static [&'static str] {
            &["cms.page.created", "cms.page.published"]
        }

        async fn apply(&self, event: &StoredEvent) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(event.event_type.clone());
            Ok(())
        }
    }

    struct AlwaysFailing(AtomicUsize);

    #[async_trait]
    impl ProjectionHandler for AlwaysFailing {
        fn projection_name(&self) -> &'static str {
            "always-failing"
        }

        fn event_types(&self) -> &'static [&'static str] {
            &["cms.page.created"]
        }

        async fn apply(&self, _event: &StoredEvent) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Infrastructure("read model down".into()))
        }
    }

    #[tokio::test]
    async fn events_outside_interest_are_skipped_without_error() {
        let recording = Arc::new(Recording {
            name: "recording",
            seen: Mutex::new(Vec::new()),
        });
        let mut engine = ProjectionEngine::new();
        engine.register(Arc::clone(&recording) as Arc<dyn ProjectionHandler>);

        engine.publish(&[stored("cms.page.deleted")]).await;

        assert!(recording.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn matching_events_reach_the_handler_in_commit_order() {
        let recording = Arc::new(Recording {
            name: "recording",
            seen: Mutex::new(Vec::new()),
        });
        let mut engine = ProjectionEngine::new();
        engine.register(Arc::clone(&recording) as Arc<dyn ProjectionHandler>);

        engine
            .publish(&[stored("cms.page.created"), stored("cms.page.published")])
            .await;

        assert_eq!(
            *recording.seen.lock().unwrap(),
            vec![
                "cms.page.created".to_owned(),
                "cms.page.published".to_owned()
            ]
        );
    }

    #[tokio::test]
    async fn one_failing_projection_does_not_block_the_others() {
        let failing = Arc::new(AlwaysFailing(AtomicUsize::new(0)));
        let survivor = Arc::new(Recording {
            name: "survivor",
            seen: Mutex::new(Vec::new()),
        });
        let mut engine = ProjectionEngine::new();
        engine.register(Arc::clone(&failing) as Arc<dyn ProjectionHandler>);
        engine.register(Arc::clone(&survivor) as Arc<dyn ProjectionHandler>);

        engine.publish(&[stored("cms.page.created")]).await;

        assert_eq!(failing.0.load(Ordering::SeqCst), 1);
        assert_eq!(
            *survivor.seen.lock().unwrap(),
            vec!["cms.page.created".to_owned()]
        );
    }
}
