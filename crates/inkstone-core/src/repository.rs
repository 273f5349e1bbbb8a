//! Aggregate repository.
//!
//! The repository exclusively owns the translation between an event stream
//! and an aggregate instance: no other component constructs aggregates from
//! history. Loading replays the stream through the event-store gateway;
//! saving appends the uncommitted buffer with an optimistic version check
//! and hands the committed events to the projection side channel.

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event::{DomainEvent, StoredEvent};
use crate::projection::EventSink;
use crate::store::EventStore;

/// Loads and persists one aggregate type through the event store.
pub struct AggregateRepository<A> {
    store: Arc<dyn EventStore>,
    sink: Option<Arc<dyn EventSink>>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: AggregateRoot> AggregateRepository<A> {
    /// Creates a repository over the given event store, with no committed-
    /// event sink attached.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            sink: None,
            _marker: PhantomData,
        }
    }

    /// Attaches the sink that receives committed events after a successful
    /// save, so projections can react.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Loads an aggregate by replaying its full event stream.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AggregateNotFound`] when the stream is empty,
    /// [`DomainError::CorruptEventStream`] when an event targets a
    /// different aggregate id, or a decode error from the event type.
    pub async fn load(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        let stream = self.store.load_stream(aggregate_id).await?;
        if stream.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        tracing::debug!(
            aggregate_kind = A::KIND,
            %aggregate_id,
            events = stream.len(),
            "reconstituting aggregate from history"
        );
        Self::reconstitute(aggregate_id, &stream)
    }

    fn reconstitute(aggregate_id: Uuid, stream: &[StoredEvent]) -> Result<A, DomainError> {
        let mut aggregate = A::uninitialized(aggregate_id);
        for stored in stream {
            if stored.aggregate_id != aggregate_id {
                return Err(DomainError::CorruptEventStream {
                    aggregate_id,
                    reason: format!(
                        "event {} targets aggregate {}",
                        stored.event_id, stored.aggregate_id
                    ),
                });
            }
            let event = A::Event::from_stored(stored)?;
            aggregate.apply(&event);
            aggregate.increment_version()?;
        }
        Ok(aggregate)
    }

    /// Persists the aggregate's uncommitted events with an optimistic
    /// version check, then clears the buffer and publishes the committed
    /// events to the attached sink. Returns the committed records.
    ///
    /// On [`DomainError::ConcurrencyConflict`] nothing is applied; the
    /// caller decides whether to reload and retry.
    ///
    /// # Errors
    ///
    /// Propagates the store's append errors unchanged.
    pub async fn save(&self, aggregate: &mut A) -> Result<Vec<StoredEvent>, DomainError> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(Vec::new());
        }

        let aggregate_id = aggregate.aggregate_id();
        let base_version = aggregate.version();
        let stored: Vec<StoredEvent> = aggregate
            .uncommitted_events()
            .iter()
            .zip(base_version + 1..)
            .map(|(event, sequence)| StoredEvent::from_event(event, sequence))
            .collect();

        self.store
            .append(aggregate_id, base_version, &stored)
            .await?;

        for _ in &stored {
            aggregate.increment_version()?;
        }
        aggregate.clear_uncommitted_events();

        tracing::debug!(
            aggregate_kind = A::KIND,
            %aggregate_id,
            events = stored.len(),
            version = aggregate.version(),
            "aggregate saved"
        );

        if let Some(sink) = &self.sink {
            sink.publish(&stored).await;
        }
        Ok(stored)
    }
}
