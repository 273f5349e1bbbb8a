//! Page-index projection.
//!
//! Maintains one denormalized row per page, keyed by slug — the page's
//! external identity. Handlers upsert by key, so re-delivering a committed
//! event leaves the read model unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use inkstone_core::error::DomainError;
use inkstone_core::event::StoredEvent;
use inkstone_core::projection::{ProjectionHandler, ReadModelStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{
    PAGE_CREATED_EVENT_TYPE, PAGE_DELETED_EVENT_TYPE, PAGE_PUBLISHED_EVENT_TYPE,
    PAGE_RENAMED_EVENT_TYPE, PageCreated, PageDeleted, PagePublished, PageRenamed, parse_payload,
};

/// Read-model collection holding the page index.
pub const PAGE_INDEX_COLLECTION: &str = "cms_pages";

/// One row of the page index, keyed by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndexRow {
    /// The page aggregate id.
    pub page_id: Uuid,
    /// The page slug (row key).
    pub slug: String,
    /// The page name.
    pub name: String,
    /// The publication status, `"draft"` or `"published"`.
    pub status: String,
}

/// Projects page events into the page index.
pub struct PageIndexProjection {
    read_models: Arc<dyn ReadModelStore>,
}

impl PageIndexProjection {
    /// Creates the projection over the given read-model store.
    #[must_use]
    pub fn new(read_models: Arc<dyn ReadModelStore>) -> Self {
        Self { read_models }
    }

    async fn load_row(&self, slug: &str) -> Result<Option<PageIndexRow>, DomainError> {
        let row = self.read_models.get(PAGE_INDEX_COLLECTION, slug).await?;
        row.map(|value| {
            serde_json::from_value(value)
                .map_err(|e| DomainError::Deserialization(format!("page index row invalid: {e}")))
        })
        .transpose()
    }

    async fn store_row(&self, row: &PageIndexRow) -> Result<(), DomainError> {
        let value =
            serde_json::to_value(row).expect("page index row serialization is infallible");
        self.read_models
            .upsert(PAGE_INDEX_COLLECTION, &row.slug, value)
            .await
    }
}

#[async_trait]
impl ProjectionHandler for PageIndexProjection {
    fn projection_name(&self) -> &'static str {
        "cms.page_index"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            PAGE_CREATED_EVENT_TYPE,
            PAGE_PUBLISHED_EVENT_TYPE,
            PAGE_RENAMED_EVENT_TYPE,
            PAGE_DELETED_EVENT_TYPE,
        ]
    }

    async fn apply(&self, event: &StoredEvent) -> Result<(), DomainError> {
        match event.event_type.as_str() {
            PAGE_CREATED_EVENT_TYPE => {
                let created: PageCreated = parse_payload(event)?;
                self.store_row(&PageIndexRow {
                    page_id: created.page_id,
                    slug: created.slug,
                    name: created.name,
                    status: "draft".to_owned(),
                })
                .await
            }
            PAGE_PUBLISHED_EVENT_TYPE => {
                let published: PagePublished = parse_payload(event)?;
                let mut row = self.load_row(&published.slug).await?.unwrap_or(PageIndexRow {
                    page_id: published.page_id,
                    slug: published.slug.clone(),
                    name: String::new(),
                    status: String::new(),
                });
                row.status = "published".to_owned();
                self.store_row(&row).await
            }
            PAGE_RENAMED_EVENT_TYPE => {
                let renamed: PageRenamed = parse_payload(event)?;
                let mut row = self.load_row(&renamed.slug).await?.unwrap_or(PageIndexRow {
                    page_id: renamed.page_id,
                    slug: renamed.slug.clone(),
                    name: String::new(),
                    status: "draft".to_owned(),
                });
                row.name = renamed.new_name;
                self.store_row(&row).await
            }
            PAGE_DELETED_EVENT_TYPE => {
                let deleted: PageDeleted = parse_payload(event)?;
                self.read_models
                    .delete(PAGE_INDEX_COLLECTION, &deleted.slug)
                    .await
            }
            // The engine only routes declared event types here.
            _ => Ok(()),
        }
    }
}
