//! Command abstractions.
//!
//! Commands are immutable intent objects representing mutations. Each
//! carries a stable dotted name token (`"<module>.<entity>.<verb>"`) used
//! for logging, tracing, and routing — independent of the Rust type name.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::event::StoredEvent;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug + 'static {
    /// The stable name token for this command, e.g. `"cms.page.create"`.
    fn command_type(&self) -> &'static str;

    /// Whether dispatch of this command must be wrapped in an atomic
    /// transaction boundary supplied by the persistence layer.
    fn transactional(&self) -> bool {
        false
    }
}

/// Handles one concrete command type, returning the committed events.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Executes the command.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when validation, loading, or persistence
    /// fails.
    async fn handle(&self, command: &C) -> Result<Vec<StoredEvent>, DomainError>;
}
