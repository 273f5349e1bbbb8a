//! Aggregate root abstraction.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// State changes only by applying events: domain operations record an event
/// into the uncommitted buffer and apply it immediately, so in-memory state
/// is consistent before persistence. `version` counts committed events and
/// is advanced exclusively by the persistence layer (or stream replay) via
/// [`AggregateRoot::increment_version`].
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Stable kind token for this aggregate, e.g. `"cms.page"`. Used in
    /// diagnostics and module configuration.
    const KIND: &'static str;

    /// Creates an uninitialized aggregate shell for the given id, ready for
    /// event replay. Only the repository and factory operations call this.
    fn uninitialized(aggregate_id: Uuid) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current committed version (number of committed events).
    fn version(&self) -> i64;

    /// Apply an event to mutate internal state. Total over the aggregate's
    /// closed event type; does not touch the version counter.
    fn apply(&mut self, event: &Self::Event);

    /// Advances the version counter by one. Called exactly once per
    /// committed event by the persistence layer or stream replay.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::VersionOverrun`] when called more times than
    /// events were applied.
    fn increment_version(&mut self) -> Result<(), DomainError>;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);
}
