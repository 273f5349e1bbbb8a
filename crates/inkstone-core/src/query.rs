//! Query abstractions.
//!
//! Queries are immutable intent objects representing pure reads. Like
//! commands they carry a stable dotted name token, but they never mutate
//! aggregate state and produce a typed result instead of events.

use async_trait::async_trait;

use crate::error::DomainError;

/// Trait that all queries implement.
pub trait Query: Send + Sync + std::fmt::Debug + 'static {
    /// The result type this query produces.
    type Output: Send + 'static;

    /// The stable name token for this query, e.g. `"cms.page.get"`.
    fn query_type(&self) -> &'static str;
}

/// Handles one concrete query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the read fails or the target does not
    /// exist.
    async fn handle(&self, query: &Q) -> Result<Q::Output, DomainError>;
}
