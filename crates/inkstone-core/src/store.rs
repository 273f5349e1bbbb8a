//! Event store gateway.
//!
//! Append-only persistence of events per aggregate stream, with a
//! version-checked append. The core consumes this interface; concrete
//! implementations live in the `inkstone-event-store` crate.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::StoredEvent;

/// Gateway to the append-only event store.
///
/// The current version of a stream is the highest stored sequence number,
/// or 0 for a stream with no events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Loads the full ordered event history for an aggregate, oldest first.
    /// Returns an empty sequence when the aggregate has never recorded
    /// events.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the store is
    /// unreachable.
    async fn load_stream(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Appends events to an aggregate stream, all-or-nothing. Succeeds only
    /// when the stream's current version equals `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ConcurrencyConflict`] when the version check
    /// fails (nothing is appended), or [`DomainError::Infrastructure`] when
    /// the store is unreachable.
    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
