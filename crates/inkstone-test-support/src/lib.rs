//! Shared test mocks and utilities for the Inkstone CMS platform.

mod clock;
mod read_model;
mod store;
mod transaction;

pub use clock::FixedClock;
pub use read_model::MemoryReadModelStore;
pub use store::{ConflictingEventStore, FailingEventStore, RecordingEventStore};
pub use transaction::RecordingTransactionBoundary;
