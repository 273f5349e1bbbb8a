//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::bus::DispatchKind;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found (no event history for the id).
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict on append.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer expected the stream to be at.
        expected: i64,
        /// The actual version found in the stream.
        actual: i64,
    },

    /// No handler registered for a dispatched command or query.
    #[error("no {kind} handler registered for \"{name}\"")]
    HandlerNotFound {
        /// The command/query name token.
        name: String,
        /// Whether a command or a query was dispatched.
        kind: DispatchKind,
    },

    /// A second handler was registered for the same command or query type.
    #[error("a {kind} handler is already registered for {type_name}")]
    HandlerAlreadyRegistered {
        /// The Rust type name of the command/query.
        type_name: &'static str,
        /// Whether the registration was for a command or a query.
        kind: DispatchKind,
    },

    /// An event stream is structurally inconsistent with the aggregate
    /// being reconstituted. Fatal for the operation in progress.
    #[error("corrupt event stream for aggregate {aggregate_id}: {reason}")]
    CorruptEventStream {
        /// The aggregate being reconstituted.
        aggregate_id: Uuid,
        /// What was wrong with the stream.
        reason: String,
    },

    /// A stored event carries a type token the target aggregate does not
    /// declare. A programming error, fatal for the operation in progress.
    #[error("unhandled event type \"{event_type}\" for aggregate kind \"{aggregate_kind}\"")]
    UnhandledEventType {
        /// The unrecognized event type token.
        event_type: String,
        /// The aggregate kind that rejected it.
        aggregate_kind: &'static str,
    },

    /// `increment_version` was called more times than events were applied.
    #[error("version increment overrun on aggregate {aggregate_id}")]
    VersionOverrun {
        /// The aggregate whose version bookkeeping was violated.
        aggregate_id: Uuid,
    },

    /// A stored event payload could not be deserialized.
    #[error("event deserialization failed: {0}")]
    Deserialization(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
