//! Aggregate roots for the Pages context.

use inkstone_core::aggregate::AggregateRoot;
use inkstone_core::clock::Clock;
use inkstone_core::error::DomainError;
use inkstone_core::event::EventMetadata;
use uuid::Uuid;

use crate::domain::events::{
    PAGE_AGGREGATE_KIND, PageCreated, PageDeleted, PageEvent, PageEventKind, PagePublished,
    PageRenamed,
};

/// Publication status of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Created but not yet published.
    Draft,
    /// Visible to readers.
    Published,
}

impl PageStatus {
    /// The status as it appears in read-model rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// The aggregate root for a CMS page.
///
/// State changes only through [`PageEvent`]s: domain operations record an
/// event and apply it immediately, so callers observe consistent state
/// before persistence.
#[derive(Debug)]
pub struct Page {
    id: Uuid,
    version: i64,
    applied: i64,
    uncommitted: Vec<PageEvent>,
    name: String,
    slug: String,
    status: PageStatus,
    deleted: bool,
}

impl Page {
    /// Factory operation: creates a fresh page in draft status, recording
    /// one `PageCreated` event.
    #[must_use]
    pub fn create(page_id: Uuid, name: String, slug: String, clock: &dyn Clock) -> Self {
        let mut page = Self::uninitialized(page_id);
        page.record(PageEvent {
            metadata: EventMetadata::record(page_id, clock),
            kind: PageEventKind::Created(PageCreated {
                page_id,
                name,
                slug,
            }),
        });
        page
    }

    /// Publishes a draft page.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the page is deleted or
    /// already published.
    pub fn publish(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        if self.status == PageStatus::Published {
            return Err(DomainError::Validation("page is already published".into()));
        }
        self.record(PageEvent {
            metadata: EventMetadata::record(self.id, clock),
            kind: PageEventKind::Published(PagePublished {
                page_id: self.id,
                slug: self.slug.clone(),
            }),
        });
        Ok(())
    }

    /// Renames the page.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the page is deleted.
    pub fn rename(&mut self, new_name: String, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.record(PageEvent {
            metadata: EventMetadata::record(self.id, clock),
            kind: PageEventKind::Renamed(PageRenamed {
                page_id: self.id,
                slug: self.slug.clone(),
                new_name,
            }),
        });
        Ok(())
    }

    /// Marks the page deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the page is already
    /// deleted.
    pub fn delete(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.record(PageEvent {
            metadata: EventMetadata::record(self.id, clock),
            kind: PageEventKind::Deleted(PageDeleted {
                page_id: self.id,
                slug: self.slug.clone(),
            }),
        });
        Ok(())
    }

    /// The page name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The page slug — the external identity read models key on.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The publication status.
    #[must_use]
    pub fn status(&self) -> PageStatus {
        self.status
    }

    /// Whether the page has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.deleted {
            return Err(DomainError::Validation("page has been deleted".into()));
        }
        Ok(())
    }

    fn record(&mut self, event: PageEvent) {
        self.apply(&event);
        self.uncommitted.push(event);
    }
}

impl AggregateRoot for Page {
    type Event = PageEvent;

    const KIND: &'static str = PAGE_AGGREGATE_KIND;

    fn uninitialized(aggregate_id: Uuid) -> Self {
        Self {
            id: aggregate_id,
            version: 0,
            applied: 0,
            uncommitted: Vec::new(),
            name: String::new(),
            slug: String::new(),
            status: PageStatus::Draft,
            deleted: false,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &PageEvent) {
        match &event.kind {
            PageEventKind::Created(created) => {
                self.name.clone_from(&created.name);
                self.slug.clone_from(&created.slug);
                self.status = PageStatus::Draft;
            }
            PageEventKind::Published(_) => self.status = PageStatus::Published,
            PageEventKind::Renamed(renamed) => self.name.clone_from(&renamed.new_name),
            PageEventKind::Deleted(_) => self.deleted = true,
        }
        self.applied += 1;
    }

    fn increment_version(&mut self) -> Result<(), DomainError> {
        if self.version >= self.applied {
            return Err(DomainError::VersionOverrun {
                aggregate_id: self.id,
            });
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[PageEvent] {
        &self.uncommitted
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted.clear();
    }
}
