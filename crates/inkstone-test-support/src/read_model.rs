//! In-memory read-model store for projection tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use inkstone_core::error::DomainError;
use inkstone_core::projection::ReadModelStore;
use serde_json::Value;

/// A `ReadModelStore` keeping rows in a nested map keyed by collection and
/// business identifier.
#[derive(Debug, Default)]
pub struct MemoryReadModelStore {
    collections: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryReadModelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows in a collection.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn row_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// Returns a snapshot of a whole collection, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn rows(&self, collection: &str) -> HashMap<String, Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReadModelStore for MemoryReadModelStore {
    async fn upsert(&self, collection: &str, key: &str, row: Value) -> Result<(), DomainError> {
        self.collections
            .lock()
            .map_err(|_| DomainError::Infrastructure("read model lock poisoned".into()))?
            .entry(collection.to_owned())
            .or_default()
            .insert(key.to_owned(), row);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), DomainError> {
        if let Some(rows) = self
            .collections
            .lock()
            .map_err(|_| DomainError::Infrastructure("read model lock poisoned".into()))?
            .get_mut(collection)
        {
            rows.remove(key);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, DomainError> {
        Ok(self
            .collections
            .lock()
            .map_err(|_| DomainError::Infrastructure("read model lock poisoned".into()))?
            .get(collection)
            .and_then(|rows| rows.get(key))
            .cloned())
    }
}
