//! Event store gateway implementations.
//!
//! [`MemoryEventStore`] backs tests and single-process deployments;
//! [`PgEventStore`] persists streams in PostgreSQL. Both honor the same
//! contract: `append` succeeds only when the stream's current version
//! equals the expected version, all-or-nothing.

pub mod memory;
pub mod pg;
pub mod schema;

pub use memory::MemoryEventStore;
pub use pg::PgEventStore;
