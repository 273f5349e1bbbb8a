//! Domain event abstractions.
//!
//! A domain event is an immutable fact record. Identity, timestamp, schema
//! version, and opaque metadata are auto-populated at construction via
//! [`EventMetadata::record`] and overridden only when reconstructing events
//! from storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;

/// Metadata attached to every domain event.
///
/// Never mutated after construction; event equality is by `event_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// Integer schema version for forward-compatible deserialization.
    pub event_version: i32,
    /// Opaque key/value attributes (actor, correlation id, IP, ...).
    pub attributes: BTreeMap<String, String>,
    /// Timestamp of event creation, microsecond precision.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for a freshly recorded event: new event id, current
    /// time, schema version 1, empty attributes.
    #[must_use]
    pub fn record(aggregate_id: Uuid, clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            event_version: 1,
            attributes: BTreeMap::new(),
            occurred_at: clock.now(),
        }
    }

    /// Attaches an opaque attribute to the metadata being built.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Rebuilds metadata from a stored record, overriding every default.
    #[must_use]
    pub fn from_stored(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            aggregate_id: stored.aggregate_id,
            event_version: stored.event_version,
            attributes: stored.attributes.clone(),
            occurred_at: stored.occurred_at,
        }
    }
}

impl PartialEq for EventMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.event_id == other.event_id
    }
}

impl Eq for EventMetadata {}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type token (used for serialization routing and
    /// projection interest matching), e.g. `"cms.page.created"`.
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Reconstructs a typed event from its stored record, routing on the
    /// stored event type token.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnhandledEventType`] when the stored token is
    /// not one this event type declares, or [`DomainError::Deserialization`]
    /// when required payload fields are absent.
    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError>
    where
        Self: Sized;
}

/// Flat, storage-ready representation of a domain event.
///
/// This is the shape the event-store gateway persists and the projection
/// engine consumes. `occurred_at` serializes in a fixed, sortable string
/// format. Equality is by `event_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type token for deserialization routing.
    pub event_type: String,
    /// Schema version of the payload.
    pub event_version: i32,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream, starting at 1.
    pub sequence_number: i64,
    /// Opaque key/value attributes.
    pub attributes: BTreeMap<String, String>,
    /// Timestamp of event creation.
    #[serde(with = "sortable_timestamp")]
    pub occurred_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Flattens a typed event into its storage form, assigning the stream
    /// sequence number chosen by the persistence layer.
    #[must_use]
    pub fn from_event<E: DomainEvent>(event: &E, sequence_number: i64) -> Self {
        let meta = event.metadata();
        Self {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: event.event_type().to_owned(),
            event_version: meta.event_version,
            payload: event.to_payload(),
            sequence_number,
            attributes: meta.attributes.clone(),
            occurred_at: meta.occurred_at,
        }
    }
}

impl PartialEq for StoredEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event_id == other.event_id
    }
}

impl Eq for StoredEvent {}

/// Serde adapter rendering timestamps as `%Y-%m-%dT%H:%M:%S%.6fZ` — fixed
/// width and lexicographically sortable.
pub mod sortable_timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// The fixed timestamp format used in stored-event records.
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    /// Serializes a timestamp in the fixed sortable format.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    /// Parses a timestamp from the fixed sortable format.
    ///
    /// # Errors
    ///
    /// Fails when the string does not match [`FORMAT`].
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(serde::de::Error::custom)
    }
}
