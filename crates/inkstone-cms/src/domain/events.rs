//! Domain events for the Pages context.
//!
//! Every payload carries the page slug so projections can key read-model
//! rows by the page's external identity rather than its aggregate id.

use inkstone_core::error::DomainError;
use inkstone_core::event::{DomainEvent, EventMetadata, StoredEvent};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Stable kind token for the page aggregate.
pub const PAGE_AGGREGATE_KIND: &str = "cms.page";

/// Event type token for [`PageCreated`].
pub const PAGE_CREATED_EVENT_TYPE: &str = "cms.page.created";
/// Event type token for [`PagePublished`].
pub const PAGE_PUBLISHED_EVENT_TYPE: &str = "cms.page.published";
/// Event type token for [`PageRenamed`].
pub const PAGE_RENAMED_EVENT_TYPE: &str = "cms.page.renamed";
/// Event type token for [`PageDeleted`].
pub const PAGE_DELETED_EVENT_TYPE: &str = "cms.page.deleted";

/// Emitted when a page is created, in draft status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCreated {
    /// The page identifier.
    pub page_id: Uuid,
    /// The page name.
    pub name: String,
    /// The page slug (external identity).
    pub slug: String,
}

/// Emitted when a draft page is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePublished {
    /// The page identifier.
    pub page_id: Uuid,
    /// The page slug.
    pub slug: String,
}

/// Emitted when a page is renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRenamed {
    /// The page identifier.
    pub page_id: Uuid,
    /// The page slug.
    pub slug: String,
    /// The new page name.
    pub new_name: String,
}

/// Emitted when a page is deleted. Deletion is a state flag, not object
/// destruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDeleted {
    /// The page identifier.
    pub page_id: Uuid,
    /// The page slug.
    pub slug: String,
}

/// Event payload variants for the Pages context.
#[derive(Debug, Clone)]
pub enum PageEventKind {
    /// A page has been created.
    Created(PageCreated),
    /// A page has been published.
    Published(PagePublished),
    /// A page has been renamed.
    Renamed(PageRenamed),
    /// A page has been deleted.
    Deleted(PageDeleted),
}

/// Domain event envelope for the Pages context. Equality is by event id.
#[derive(Debug, Clone)]
pub struct PageEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: PageEventKind,
}

impl PartialEq for PageEvent {
    fn eq(&self, other: &Self) -> bool {
        self.metadata.event_id == other.metadata.event_id
    }
}

impl Eq for PageEvent {}

pub(crate) fn parse_payload<T: DeserializeOwned>(stored: &StoredEvent) -> Result<T, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| {
        DomainError::Deserialization(format!("{} payload invalid: {e}", stored.event_type))
    })
}

impl DomainEvent for PageEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            PageEventKind::Created(_) => PAGE_CREATED_EVENT_TYPE,
            PageEventKind::Published(_) => PAGE_PUBLISHED_EVENT_TYPE,
            PageEventKind::Renamed(_) => PAGE_RENAMED_EVENT_TYPE,
            PageEventKind::Deleted(_) => PAGE_DELETED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        match &self.kind {
            PageEventKind::Created(e) => serde_json::to_value(e),
            PageEventKind::Published(e) => serde_json::to_value(e),
            PageEventKind::Renamed(e) => serde_json::to_value(e),
            PageEventKind::Deleted(e) => serde_json::to_value(e),
        }
        .expect("page event payload serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind = match stored.event_type.as_str() {
            PAGE_CREATED_EVENT_TYPE => PageEventKind::Created(parse_payload(stored)?),
            PAGE_PUBLISHED_EVENT_TYPE => PageEventKind::Published(parse_payload(stored)?),
            PAGE_RENAMED_EVENT_TYPE => PageEventKind::Renamed(parse_payload(stored)?),
            PAGE_DELETED_EVENT_TYPE => PageEventKind::Deleted(parse_payload(stored)?),
            other => {
                return Err(DomainError::UnhandledEventType {
                    event_type: other.to_owned(),
                    aggregate_kind: PAGE_AGGREGATE_KIND,
                });
            }
        };
        Ok(Self {
            metadata: EventMetadata::from_stored(stored),
            kind,
        })
    }
}
