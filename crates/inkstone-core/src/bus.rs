//! Command and query buses.
//!
//! Each bus is an explicit registration table built at process startup: a
//! mapping from the concrete command/query type to a single handler.
//! Registering a second handler for the same type is a configuration error
//! caught at registration time, not at dispatch time. Dispatch resolves the
//! handler by the envelope's runtime type and is traced keyed on the
//! envelope's declared name token.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::command::{Command, CommandHandler};
use crate::error::DomainError;
use crate::event::StoredEvent;
use crate::query::{Query, QueryHandler};

/// Whether a dispatch concerned a command or a query. Carried in dispatch
/// errors for logging/telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    /// A write-side dispatch.
    Command,
    /// A read-side dispatch.
    Query,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// Supplies atomic transaction scopes for transactional command dispatch.
/// Implemented by the external persistence layer.
#[async_trait]
pub trait TransactionBoundary: Send + Sync {
    /// Opens a new transaction scope.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when a transaction cannot be
    /// opened.
    async fn begin(&self) -> Result<Box<dyn TransactionScope>, DomainError>;
}

/// An open transaction: consumed by exactly one of `commit` or `rollback`.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the commit fails.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the rollback fails.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

#[async_trait]
trait ErasedCommandHandler: Send + Sync {
    async fn handle(
        &self,
        command: &(dyn Any + Send + Sync),
    ) -> Result<Vec<StoredEvent>, DomainError>;
}

struct TypedCommandHandler<C, H> {
    handler: H,
    _marker: PhantomData<fn() -> C>,
}

#[async_trait]
impl<C, H> ErasedCommandHandler for TypedCommandHandler<C, H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(
        &self,
        command: &(dyn Any + Send + Sync),
    ) -> Result<Vec<StoredEvent>, DomainError> {
        // The table is keyed by TypeId, so a mismatch here is unreachable.
        let command = command.downcast_ref::<C>().ok_or_else(|| {
            DomainError::Infrastructure("command dispatch table type mismatch".into())
        })?;
        self.handler.handle(command).await
    }
}

/// Resolves exactly one handler per concrete command type and invokes it,
/// optionally wrapping execution in a transaction boundary.
#[derive(Default)]
pub struct CommandBus {
    handlers: HashMap<TypeId, Box<dyn ErasedCommandHandler>>,
    transactions: Option<Arc<dyn TransactionBoundary>>,
}

impl CommandBus {
    /// Creates an empty command bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the transaction boundary used for transactional commands.
    /// Without one, transactional commands dispatch unwrapped.
    #[must_use]
    pub fn with_transactions(mut self, boundary: Arc<dyn TransactionBoundary>) -> Self {
        self.transactions = Some(boundary);
        self
    }

    /// Registers the single handler for command type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HandlerAlreadyRegistered`] when a handler for
    /// `C` is already present.
    pub fn register<C, H>(&mut self, handler: H) -> Result<(), DomainError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(DomainError::HandlerAlreadyRegistered {
                type_name: std::any::type_name::<C>(),
                kind: DispatchKind::Command,
            }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(TypedCommandHandler {
                    handler,
                    _marker: PhantomData,
                }));
                Ok(())
            }
        }
    }

    /// Dispatches a command to its registered handler and returns the
    /// committed events. A command with `transactional() == true` runs
    /// inside a transaction scope: handler success commits, any failure
    /// rolls back and the original error propagates unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HandlerNotFound`] when no handler is
    /// registered for `C`; otherwise propagates the handler's error.
    pub async fn dispatch<C: Command>(&self, command: &C) -> Result<Vec<StoredEvent>, DomainError> {
        let token = command.command_type();
        let handler =
            self.handlers
                .get(&TypeId::of::<C>())
                .ok_or_else(|| DomainError::HandlerNotFound {
                    name: token.to_owned(),
                    kind: DispatchKind::Command,
                })?;

        tracing::debug!(command = token, "dispatching command");

        let result = if command.transactional()
            && let Some(boundary) = &self.transactions
        {
            let scope = boundary.begin().await?;
            match handler.handle(command as &(dyn Any + Send + Sync)).await {
                Ok(events) => {
                    scope.commit().await?;
                    Ok(events)
                }
                Err(error) => {
                    if let Err(rollback_error) = scope.rollback().await {
                        tracing::error!(
                            command = token,
                            %rollback_error,
                            "rollback failed after command error"
                        );
                    }
                    Err(error)
                }
            }
        } else {
            handler.handle(command as &(dyn Any + Send + Sync)).await
        };

        match &result {
            Ok(events) => {
                tracing::info!(command = token, events = events.len(), "command handled");
            }
            Err(error) => tracing::warn!(command = token, %error, "command failed"),
        }
        result
    }
}

#[async_trait]
trait ErasedQueryHandler: Send + Sync {
    async fn handle(
        &self,
        query: &(dyn Any + Send + Sync),
    ) -> Result<Box<dyn Any + Send>, DomainError>;
}

struct TypedQueryHandler<Q, H> {
    handler: H,
    _marker: PhantomData<fn() -> Q>,
}

#[async_trait]
impl<Q, H> ErasedQueryHandler for TypedQueryHandler<Q, H>
where
    Q: Query,
    H: QueryHandler<Q>,
{
    async fn handle(
        &self,
        query: &(dyn Any + Send + Sync),
    ) -> Result<Box<dyn Any + Send>, DomainError> {
        let query = query.downcast_ref::<Q>().ok_or_else(|| {
            DomainError::Infrastructure("query dispatch table type mismatch".into())
        })?;
        let output = self.handler.handle(query).await?;
        Ok(Box::new(output))
    }
}

/// Resolves exactly one handler per concrete query type and invokes it.
#[derive(Default)]
pub struct QueryBus {
    handlers: HashMap<TypeId, Box<dyn ErasedQueryHandler>>,
}

impl QueryBus {
    /// Creates an empty query bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the single handler for query type `Q`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HandlerAlreadyRegistered`] when a handler for
    /// `Q` is already present.
    pub fn register<Q, H>(&mut self, handler: H) -> Result<(), DomainError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        match self.handlers.entry(TypeId::of::<Q>()) {
            Entry::Occupied(_) => Err(DomainError::HandlerAlreadyRegistered {
                type_name: std::any::type_name::<Q>(),
                kind: DispatchKind::Query,
            }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(TypedQueryHandler {
                    handler,
                    _marker: PhantomData,
                }));
                Ok(())
            }
        }
    }

    /// Dispatches a query to its registered handler and returns its typed
    /// output.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HandlerNotFound`] when no handler is
    /// registered for `Q`; otherwise propagates the handler's error.
    pub async fn dispatch<Q: Query>(&self, query: &Q) -> Result<Q::Output, DomainError> {
        let token = query.query_type();
        let handler =
            self.handlers
                .get(&TypeId::of::<Q>())
                .ok_or_else(|| DomainError::HandlerNotFound {
                    name: token.to_owned(),
                    kind: DispatchKind::Query,
                })?;

        tracing::debug!(query = token, "dispatching query");

        let output = handler.handle(query as &(dyn Any + Send + Sync)).await?;
        output.downcast::<Q::Output>().map(|boxed| *boxed).map_err(|_| {
            DomainError::Infrastructure("query dispatch table output type mismatch".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Ping {
        transactional: bool,
    }

    impl Command for Ping {
        fn command_type(&self) -> &'static str {
            "test.ping.send"
        }

        fn transactional(&self) -> bool {
            self.transactional
        }
    }

    struct PingHandler {
        fail: bool,
    }

    #[async_trait]
    impl CommandHandler<Ping> for PingHandler {
        async fn handle(&self, _command: &Ping) -> Result<Vec<StoredEvent>, DomainError> {
            if self.fail {
                Err(DomainError::Validation("ping rejected".into()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[derive(Debug)]
    struct CountPings;

    impl Query for CountPings {
        type Output = usize;

        fn query_type(&self) -> &'static str {
            "test.ping.count"
        }
    }

    struct CountPingsHandler(usize);

    #[async_trait]
    impl QueryHandler<CountPings> for CountPingsHandler {
        async fn handle(&self, _query: &CountPings) -> Result<usize, DomainError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingBoundary {
        begun: AtomicUsize,
        log: Mutex<Vec<&'static str>>,
    }

    struct RecordingScope(Arc<RecordingBoundary>);

    #[async_trait]
    impl TransactionBoundary for Arc<RecordingBoundary> {
        async fn begin(&self) -> Result<Box<dyn TransactionScope>, DomainError> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingScope(Arc::clone(self))))
        }
    }

    #[async_trait]
    impl TransactionScope for RecordingScope {
        async fn commit(self: Box<Self>) -> Result<(), DomainError> {
            self.0.log.lock().unwrap().push("commit");
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
            self.0.log.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_without_handler_names_the_command_token() {
        let bus = CommandBus::new();

        let result = bus.dispatch(&Ping {
            transactional: false,
        })
        .await;

        match result.unwrap_err() {
            DomainError::HandlerNotFound { name, kind } => {
                assert_eq!(name, "test.ping.send");
                assert_eq!(kind, DispatchKind::Command);
            }
            other => panic!("expected HandlerNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_registration_for_same_command_fails() {
        let mut bus = CommandBus::new();
        bus.register::<Ping, _>(PingHandler { fail: false }).unwrap();

        let result = bus.register::<Ping, _>(PingHandler { fail: false });

        match result.unwrap_err() {
            DomainError::HandlerAlreadyRegistered { kind, .. } => {
                assert_eq!(kind, DispatchKind::Command);
            }
            other => panic!("expected HandlerAlreadyRegistered, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transactional_command_commits_on_success() {
        let boundary = Arc::new(RecordingBoundary::default());
        let mut bus = CommandBus::new().with_transactions(Arc::new(Arc::clone(&boundary)));
        bus.register::<Ping, _>(PingHandler { fail: false }).unwrap();

        bus.dispatch(&Ping {
            transactional: true,
        })
        .await
        .unwrap();

        assert_eq!(boundary.begun.load(Ordering::SeqCst), 1);
        assert_eq!(*boundary.log.lock().unwrap(), vec!["commit"]);
    }

    #[tokio::test]
    async fn transactional_command_rolls_back_and_propagates_original_error() {
        let boundary = Arc::new(RecordingBoundary::default());
        let mut bus = CommandBus::new().with_transactions(Arc::new(Arc::clone(&boundary)));
        bus.register::<Ping, _>(PingHandler { fail: true }).unwrap();

        let result = bus
            .dispatch(&Ping {
                transactional: true,
            })
            .await;

        match result.unwrap_err() {
            DomainError::Validation(msg) => assert_eq!(msg, "ping rejected"),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(*boundary.log.lock().unwrap(), vec!["rollback"]);
    }

    #[tokio::test]
    async fn non_transactional_command_skips_the_boundary() {
        let boundary = Arc::new(RecordingBoundary::default());
        let mut bus = CommandBus::new().with_transactions(Arc::new(Arc::clone(&boundary)));
        bus.register::<Ping, _>(PingHandler { fail: false }).unwrap();

        bus.dispatch(&Ping {
            transactional: false,
        })
        .await
        .unwrap();

        assert_eq!(boundary.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_registration_for_same_query_fails() {
        let mut bus = QueryBus::new();
        bus.register::<CountPings, _>(CountPingsHandler(1)).unwrap();

        let result = bus.register::<CountPings, _>(CountPingsHandler(2));

        match result.unwrap_err() {
            DomainError::HandlerAlreadyRegistered { kind, .. } => {
                assert_eq!(kind, DispatchKind::Query);
            }
            other => panic!("expected HandlerAlreadyRegistered, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_dispatch_returns_typed_output() {
        let mut bus = QueryBus::new();
        bus.register::<CountPings, _>(CountPingsHandler(3)).unwrap();

        let count = bus.dispatch(&CountPings).await.unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn query_dispatch_without_handler_names_the_query_token() {
        let bus = QueryBus::new();

        let result = bus.dispatch(&CountPings).await;

        match result.unwrap_err() {
            DomainError::HandlerNotFound { name, kind } => {
                assert_eq!(name, "test.ping.count");
                assert_eq!(kind, DispatchKind::Query);
            }
            other => panic!("expected HandlerNotFound, got {other:?}"),
        }
    }
}
