//! End-to-end scenarios for the Pages context, wired through `bootstrap`
//! over the in-memory event store.

use std::sync::Arc;

use inkstone_cms::application::query_handlers::{GetPage, GetPageBySlug};
use inkstone_cms::bootstrap::{CmsRuntime, bootstrap};
use inkstone_cms::domain::aggregates::Page;
use inkstone_cms::domain::commands::{CreatePage, DeletePage, PublishPage, RenamePage};
use inkstone_cms::projection::PAGE_INDEX_COLLECTION;
use inkstone_core::aggregate::AggregateRoot;
use inkstone_core::bus::TransactionBoundary;
use inkstone_core::clock::Clock;
use inkstone_core::config::ModuleRegistry;
use inkstone_core::error::DomainError;
use inkstone_core::projection::ReadModelStore;
use inkstone_core::repository::AggregateRepository;
use inkstone_core::store::EventStore;
use inkstone_event_store::memory::MemoryEventStore;
use inkstone_test_support::{FixedClock, MemoryReadModelStore, RecordingTransactionBoundary};
use uuid::Uuid;

fn registry() -> ModuleRegistry {
    ModuleRegistry::from_value(serde_json::json!({
        "cms": {
            "enabled": true,
            "auto_record": true,
            "aggregates": {
                "page": { "observer": "page_index" }
            }
        }
    }))
    .unwrap()
}

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(2026, 1, 15, 10, 0, 0))
}

struct Harness {
    runtime: CmsRuntime,
    store: MemoryEventStore,
    read_models: Arc<MemoryReadModelStore>,
}

fn harness() -> Harness {
    let store = MemoryEventStore::new();
    let read_models = Arc::new(MemoryReadModelStore::new());
    let runtime = bootstrap(
        &registry(),
        Arc::new(store.clone()) as Arc<dyn EventStore>,
        Arc::clone(&read_models) as Arc<dyn ReadModelStore>,
        fixed_clock(),
        None,
    )
    .unwrap()
    .expect("cms module is enabled");
    Harness {
        runtime,
        store,
        read_models,
    }
}

#[tokio::test]
async fn creating_a_page_commits_one_event_and_indexes_the_draft() {
    // Arrange
    let h = harness();
    let page_id = Uuid::new_v4();

    // Act
    let committed = h
        .runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].sequence_number, 1);
    let row = h
        .read_models
        .get(PAGE_INDEX_COLLECTION, "hello")
        .await
        .unwrap()
        .expect("page indexed");
    assert_eq!(row["slug"], "hello");
    assert_eq!(row["status"], "draft");
    assert_eq!(row["name"], "Hello");

    let view = h.runtime.query_bus.dispatch(&GetPage { page_id }).await.unwrap();
    assert_eq!(view.version, 1);
    assert_eq!(view.status, "draft");
}

#[tokio::test]
async fn publishing_then_reconstructing_yields_version_two() {
    // Arrange
    let h = harness();
    let page_id = Uuid::new_v4();
    h.runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();

    // Act
    h.runtime
        .command_bus
        .dispatch(&PublishPage { page_id })
        .await
        .unwrap();

    // Assert
    let view = h.runtime.query_bus.dispatch(&GetPage { page_id }).await.unwrap();
    assert_eq!(view.version, 2);
    assert_eq!(view.status, "published");

    let indexed = h
        .runtime
        .query_bus
        .dispatch(&GetPageBySlug {
            slug: "hello".to_owned(),
        })
        .await
        .unwrap()
        .expect("page indexed");
    assert_eq!(indexed.status, "published");
    assert_eq!(indexed.page_id, page_id);
}

#[tokio::test]
async fn deleting_a_page_removes_it_from_the_index() {
    // Arrange
    let h = harness();
    let page_id = Uuid::new_v4();
    h.runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();

    // Act
    h.runtime
        .command_bus
        .dispatch(&DeletePage { page_id })
        .await
        .unwrap();

    // Assert
    assert_eq!(h.read_models.row_count(PAGE_INDEX_COLLECTION), 0);
    let view = h.runtime.query_bus.dispatch(&GetPage { page_id }).await.unwrap();
    assert!(view.deleted);
}

#[tokio::test]
async fn concurrent_writers_conflict_and_the_loser_retries_successfully() {
    // Arrange: a page with two committed events, loaded by two writers.
    let h = harness();
    let page_id = Uuid::new_v4();
    h.runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();
    h.runtime
        .command_bus
        .dispatch(&PublishPage { page_id })
        .await
        .unwrap();

    let repository: AggregateRepository<Page> =
        AggregateRepository::new(Arc::new(h.store.clone()) as Arc<dyn EventStore>);
    let clock = fixed_clock();
    let mut writer_a = repository.load(page_id).await.unwrap();
    let mut writer_b = repository.load(page_id).await.unwrap();
    assert_eq!(writer_a.version(), 2);

    // Act: writer B commits first, writer A's save must conflict.
    writer_b
        .rename("Renamed by B".to_owned(), clock.as_ref())
        .unwrap();
    repository.save(&mut writer_b).await.unwrap();

    writer_a
        .rename("Renamed by A".to_owned(), clock.as_ref())
        .unwrap();
    let conflict = repository.save(&mut writer_a).await;

    // Assert
    match conflict.unwrap_err() {
        DomainError::ConcurrencyConflict {
            aggregate_id,
            expected,
            actual,
        } => {
            assert_eq!(aggregate_id, page_id);
            assert_eq!(expected, 2);
            assert_eq!(actual, 3);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }

    // The loser reloads current state and retries.
    let mut retried = repository.load(page_id).await.unwrap();
    assert_eq!(retried.version(), 3);
    assert_eq!(retried.name(), "Renamed by B");
    retried
        .rename("Renamed by A".to_owned(), clock.as_ref())
        .unwrap();
    repository.save(&mut retried).await.unwrap();
    assert_eq!(retried.version(), 4);
}

#[tokio::test]
async fn replaying_the_same_stream_twice_is_deterministic() {
    // Arrange
    let h = harness();
    let page_id = Uuid::new_v4();
    h.runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();
    h.runtime
        .command_bus
        .dispatch(&RenamePage {
            page_id,
            new_name: "Hello, world".to_owned(),
        })
        .await
        .unwrap();
    h.runtime
        .command_bus
        .dispatch(&PublishPage { page_id })
        .await
        .unwrap();
    let stream = h.store.load_stream(page_id).await.unwrap();

    let repository: AggregateRepository<Page> =
        AggregateRepository::new(Arc::new(h.store.clone()) as Arc<dyn EventStore>);

    // Act
    let first = repository.load(page_id).await.unwrap();
    let second = repository.load(page_id).await.unwrap();

    // Assert
    assert_eq!(first.version(), i64::try_from(stream.len()).unwrap());
    assert_eq!(first.version(), second.version());
    assert_eq!(first.name(), second.name());
    assert_eq!(first.slug(), second.slug());
    assert_eq!(first.status(), second.status());
    assert_eq!(first.is_deleted(), second.is_deleted());
    assert!(first.uncommitted_events().is_empty());
}

#[tokio::test]
async fn reapplying_a_committed_event_leaves_the_index_unchanged() {
    // Arrange
    let h = harness();
    let page_id = Uuid::new_v4();
    h.runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id,
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();
    let stream = h.store.load_stream(page_id).await.unwrap();
    let before = h.read_models.rows(PAGE_INDEX_COLLECTION);

    // Act: redeliver the already-projected event.
    h.runtime.projections.publish(&stream).await;

    // Assert
    assert_eq!(h.read_models.rows(PAGE_INDEX_COLLECTION), before);
    assert_eq!(h.read_models.row_count(PAGE_INDEX_COLLECTION), 1);
}

#[tokio::test]
async fn bootstrap_skips_a_disabled_module() {
    // Arrange
    let registry = ModuleRegistry::from_value(serde_json::json!({
        "cms": { "enabled": false }
    }))
    .unwrap();

    // Act
    let runtime = bootstrap(
        &registry,
        Arc::new(MemoryEventStore::new()) as Arc<dyn EventStore>,
        Arc::new(MemoryReadModelStore::new()) as Arc<dyn ReadModelStore>,
        fixed_clock(),
        None,
    )
    .unwrap();

    // Assert
    assert!(runtime.is_none());
}

#[tokio::test]
async fn transactional_commands_run_inside_a_transaction_scope() {
    // Arrange
    let boundary = Arc::new(RecordingTransactionBoundary::new());
    let runtime = bootstrap(
        &registry(),
        Arc::new(MemoryEventStore::new()) as Arc<dyn EventStore>,
        Arc::new(MemoryReadModelStore::new()) as Arc<dyn ReadModelStore>,
        fixed_clock(),
        Some(Arc::clone(&boundary) as Arc<dyn TransactionBoundary>),
    )
    .unwrap()
    .expect("cms module is enabled");

    // Act
    runtime
        .command_bus
        .dispatch(&CreatePage {
            page_id: Uuid::new_v4(),
            name: "Hello".to_owned(),
            slug: "hello".to_owned(),
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(boundary.log(), vec!["begin", "commit"]);
}
