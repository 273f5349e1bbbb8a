//! Wires the Pages context: projection engine, repository, and both buses,
//! driven by the module configuration.

use std::sync::Arc;

use inkstone_core::bus::{CommandBus, QueryBus, TransactionBoundary};
use inkstone_core::clock::Clock;
use inkstone_core::config::ModuleRegistry;
use inkstone_core::error::DomainError;
use inkstone_core::projection::{EventSink, ProjectionEngine, ProjectionHandler, ReadModelStore};
use inkstone_core::repository::AggregateRepository;
use inkstone_core::store::EventStore;

use crate::application::command_handlers::{
    CreatePageHandler, DeletePageHandler, PublishPageHandler, RenamePageHandler,
};
use crate::application::query_handlers::{GetPage, GetPageBySlug, GetPageBySlugHandler, GetPageHandler};
use crate::domain::commands::{CreatePage, DeletePage, PublishPage, RenamePage};
use crate::projection::PageIndexProjection;

/// Module name in the configuration registry.
pub const MODULE_NAME: &str = "cms";
/// Aggregate name in the configuration registry.
pub const PAGE_AGGREGATE: &str = "page";

/// The fully wired Pages context.
pub struct CmsRuntime {
    /// Command bus with every page command handler registered.
    pub command_bus: CommandBus,
    /// Query bus with every page query handler registered.
    pub query_bus: QueryBus,
    /// Projection engine, also attached to the repository as its sink.
    pub projections: Arc<ProjectionEngine>,
}

/// Builds the Pages context runtime, or `None` when the module is disabled
/// in the registry.
///
/// # Errors
///
/// Returns [`DomainError::HandlerAlreadyRegistered`] when handler
/// registration conflicts, which indicates a wiring bug.
pub fn bootstrap(
    registry: &ModuleRegistry,
    store: Arc<dyn EventStore>,
    read_models: Arc<dyn ReadModelStore>,
    clock: Arc<dyn Clock>,
    transactions: Option<Arc<dyn TransactionBoundary>>,
) -> Result<Option<CmsRuntime>, DomainError> {
    if !registry.is_enabled(MODULE_NAME) {
        tracing::info!(module = MODULE_NAME, "module disabled, skipping bootstrap");
        return Ok(None);
    }

    let mut engine = ProjectionEngine::new();
    if registry
        .enabled_aggregates(MODULE_NAME)
        .contains(&PAGE_AGGREGATE)
    {
        engine.register(
            Arc::new(PageIndexProjection::new(Arc::clone(&read_models)))
                as Arc<dyn ProjectionHandler>,
        );
    }
    let projections = Arc::new(engine);

    let repository = Arc::new(
        AggregateRepository::new(store)
            .with_sink(Arc::clone(&projections) as Arc<dyn EventSink>),
    );

    let mut command_bus = match transactions {
        Some(boundary) => CommandBus::new().with_transactions(boundary),
        None => CommandBus::new(),
    };
    command_bus.register::<CreatePage, _>(CreatePageHandler::new(
        Arc::clone(&repository),
        Arc::clone(&clock),
    ))?;
    command_bus.register::<PublishPage, _>(PublishPageHandler::new(
        Arc::clone(&repository),
        Arc::clone(&clock),
    ))?;
    command_bus.register::<RenamePage, _>(RenamePageHandler::new(
        Arc::clone(&repository),
        Arc::clone(&clock),
    ))?;
    command_bus.register::<DeletePage, _>(DeletePageHandler::new(
        Arc::clone(&repository),
        Arc::clone(&clock),
    ))?;

    let mut query_bus = QueryBus::new();
    query_bus.register::<GetPage, _>(GetPageHandler::new(Arc::clone(&repository)))?;
    query_bus.register::<GetPageBySlug, _>(GetPageBySlugHandler::new(read_models))?;

    tracing::info!(module = MODULE_NAME, "module bootstrapped");
    Ok(Some(CmsRuntime {
        command_bus,
        query_bus,
        projections,
    }))
}
