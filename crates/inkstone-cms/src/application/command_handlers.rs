//! Command handlers for the Pages context.
//!
//! Each handler orchestrates one mutation: validate input, load or create
//! the aggregate, execute the domain operation, persist the resulting
//! events through the repository.

use std::sync::Arc;

use async_trait::async_trait;
use inkstone_core::clock::Clock;
use inkstone_core::command::CommandHandler;
use inkstone_core::error::DomainError;
use inkstone_core::event::StoredEvent;
use inkstone_core::repository::AggregateRepository;

use crate::domain::aggregates::Page;
use crate::domain::commands::{CreatePage, DeletePage, PublishPage, RenamePage};

/// Handles `cms.page.create`: creates a fresh aggregate and persists the
/// `PageCreated` event.
pub struct CreatePageHandler {
    repository: Arc<AggregateRepository<Page>>,
    clock: Arc<dyn Clock>,
}

impl CreatePageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<Page>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<CreatePage> for CreatePageHandler {
    async fn handle(&self, command: &CreatePage) -> Result<Vec<StoredEvent>, DomainError> {
        if command.name.trim().is_empty() {
            return Err(DomainError::Validation("page name must not be empty".into()));
        }
        if command.slug.trim().is_empty() {
            return Err(DomainError::Validation("page slug must not be empty".into()));
        }

        let mut page = Page::create(
            command.page_id,
            command.name.clone(),
            command.slug.clone(),
            self.clock.as_ref(),
        );
        self.repository.save(&mut page).await
    }
}

/// Handles `cms.page.publish`: reconstitutes the page and publishes it.
pub struct PublishPageHandler {
    repository: Arc<AggregateRepository<Page>>,
    clock: Arc<dyn Clock>,
}

impl PublishPageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<Page>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<PublishPage> for PublishPageHandler {
    async fn handle(&self, command: &PublishPage) -> Result<Vec<StoredEvent>, DomainError> {
        let mut page = self.repository.load(command.page_id).await?;
        page.publish(self.clock.as_ref())?;
        self.repository.save(&mut page).await
    }
}

/// Handles `cms.page.rename`: reconstitutes the page and renames it.
pub struct RenamePageHandler {
    repository: Arc<AggregateRepository<Page>>,
    clock: Arc<dyn Clock>,
}

impl RenamePageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<Page>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<RenamePage> for RenamePageHandler {
    async fn handle(&self, command: &RenamePage) -> Result<Vec<StoredEvent>, DomainError> {
        if command.new_name.trim().is_empty() {
            return Err(DomainError::Validation("page name must not be empty".into()));
        }

        let mut page = self.repository.load(command.page_id).await?;
        page.rename(command.new_name.clone(), self.clock.as_ref())?;
        self.repository.save(&mut page).await
    }
}

/// Handles `cms.page.delete`: reconstitutes the page and marks it deleted.
pub struct DeletePageHandler {
    repository: Arc<AggregateRepository<Page>>,
    clock: Arc<dyn Clock>,
}

impl DeletePageHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<Page>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<DeletePage> for DeletePageHandler {
    async fn handle(&self, command: &DeletePage) -> Result<Vec<StoredEvent>, DomainError> {
        let mut page = self.repository.load(command.page_id).await?;
        page.delete(self.clock.as_ref())?;
        self.repository.save(&mut page).await
    }
}
