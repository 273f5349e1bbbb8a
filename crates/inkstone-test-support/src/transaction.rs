//! Recording transaction boundary for bus tests.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use inkstone_core::bus::{TransactionBoundary, TransactionScope};
use inkstone_core::error::DomainError;

/// A transaction boundary that records begin/commit/rollback calls.
#[derive(Debug, Default)]
pub struct RecordingTransactionBoundary {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingTransactionBoundary {
    /// Creates a boundary with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded lifecycle calls in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

struct RecordingScope(Arc<Mutex<Vec<&'static str>>>);

#[async_trait]
impl TransactionBoundary for RecordingTransactionBoundary {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>, DomainError> {
        self.log.lock().unwrap().push("begin");
        Ok(Box::new(RecordingScope(Arc::clone(&self.log))))
    }
}

#[async_trait]
impl TransactionScope for RecordingScope {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.0.lock().unwrap().push("commit");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.0.lock().unwrap().push("rollback");
        Ok(())
    }
}
