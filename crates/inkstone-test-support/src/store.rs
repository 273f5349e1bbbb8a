//! Test event stores — mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use inkstone_core::error::DomainError;
use inkstone_core::event::StoredEvent;
use inkstone_core::store::EventStore;
use uuid::Uuid;

/// An event store that records all `append` calls. Returns the configured
/// stream from every `load_stream` call and always accepts appends.
#[derive(Debug, Default)]
pub struct RecordingEventStore {
    stream: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventStore {
    /// Creates a recording store that will return `stream` from every
    /// `load_stream` call.
    #[must_use]
    pub fn new(stream: Vec<StoredEvent>) -> Self {
        Self {
            stream: Mutex::new(stream),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all `append` calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn load_stream(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream.lock().unwrap().clone())
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event store whose appends always fail with a concurrency conflict at
/// the configured actual version. Useful for testing conflict handling.
#[derive(Debug)]
pub struct ConflictingEventStore {
    /// The version the store claims the stream is actually at.
    pub actual_version: i64,
    stream: Mutex<Vec<StoredEvent>>,
}

impl ConflictingEventStore {
    /// Creates a conflicting store returning `stream` from `load_stream`.
    #[must_use]
    pub fn new(actual_version: i64, stream: Vec<StoredEvent>) -> Self {
        Self {
            actual_version,
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl EventStore for ConflictingEventStore {
    async fn load_stream(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream.lock().unwrap().clone())
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected: expected_version,
            actual: self.actual_version,
        })
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn load_stream(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
