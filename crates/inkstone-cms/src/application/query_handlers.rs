//! Query handlers for the Pages context.
//!
//! `cms.page.get` reconstitutes the aggregate and returns a view DTO;
//! `cms.page.get_by_slug` reads the denormalized page index.

use std::sync::Arc;

use async_trait::async_trait;
use inkstone_core::error::DomainError;
use inkstone_core::projection::ReadModelStore;
use inkstone_core::query::{Query, QueryHandler};
use inkstone_core::repository::AggregateRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Page;
use crate::projection::{PAGE_INDEX_COLLECTION, PageIndexRow};

/// Read-only view of a page aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// The page identifier.
    pub page_id: Uuid,
    /// The page name.
    pub name: String,
    /// The page slug.
    pub slug: String,
    /// The publication status, `"draft"` or `"published"`.
    pub status: String,
    /// Whether the page has been deleted.
    pub deleted: bool,
    /// Current version (committed event count).
    pub version: i64,
}

/// Fetches a page view by aggregate id.
#[derive(Debug, Clone)]
pub struct GetPage {
    /// The page to fetch.
    pub page_id: Uuid,
}

impl Query for GetPage {
    type Output = PageView;

    fn query_type(&self) -> &'static str {
        "cms.page.get"
    }
}

/// Handles `cms.page.get` by replaying the page's event stream.
pub struct GetPageHandler {
    repository: Arc<AggregateRepository<Page>>,
}

impl GetPageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<Page>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetPage> for GetPageHandler {
    async fn handle(&self, query: &GetPage) -> Result<PageView, DomainError> {
        use inkstone_core::aggregate::AggregateRoot;

        let page = self.repository.load(query.page_id).await?;
        Ok(PageView {
            page_id: page.aggregate_id(),
            name: page.name().to_owned(),
            slug: page.slug().to_owned(),
            status: page.status().as_str().to_owned(),
            deleted: page.is_deleted(),
            version: page.version(),
        })
    }
}

/// Fetches a page-index row by slug.
#[derive(Debug, Clone)]
pub struct GetPageBySlug {
    /// The slug to look up.
    pub slug: String,
}

impl Query for GetPageBySlug {
    type Output = Option<PageIndexRow>;

    fn query_type(&self) -> &'static str {
        "cms.page.get_by_slug"
    }
}

/// Handles `cms.page.get_by_slug` against the page index read model.
pub struct GetPageBySlugHandler {
    read_models: Arc<dyn ReadModelStore>,
}

impl GetPageBySlugHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(read_models: Arc<dyn ReadModelStore>) -> Self {
        Self { read_models }
    }
}

#[async_trait]
impl QueryHandler<GetPageBySlug> for GetPageBySlugHandler {
    async fn handle(&self, query: &GetPageBySlug) -> Result<Option<PageIndexRow>, DomainError> {
        let row = self
            .read_models
            .get(PAGE_INDEX_COLLECTION, &query.slug)
            .await?;
        row.map(|value| {
            serde_json::from_value(value)
                .map_err(|e| DomainError::Deserialization(format!("page index row invalid: {e}")))
        })
        .transpose()
    }
}
