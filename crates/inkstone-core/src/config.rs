//! Module configuration registry.
//!
//! Determines, per bounded-context module, whether event sourcing,
//! auto-recording, and projections are active. The registry is constructed
//! explicitly once at process start and passed by reference to the
//! components that need it; its answers are stable for the lifetime of the
//! process. Consumed by the bootstrap path, not the runtime hot path.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::DomainError;

/// Per-aggregate configuration within a module.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateConfig {
    /// Name of the observer/projection wired for this aggregate.
    #[serde(default)]
    pub observer: String,
    /// Additional aggregate settings, kept opaque.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Configuration for one bounded-context module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Whether event sourcing is active for the module.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether domain operations auto-record events.
    #[serde(default)]
    pub auto_record: bool,
    /// Aggregates of the module, keyed by aggregate name.
    #[serde(default)]
    pub aggregates: BTreeMap<String, AggregateConfig>,
}

const fn default_enabled() -> bool {
    true
}

/// Immutable mapping from module name to module configuration.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleConfig>,
}

impl ModuleRegistry {
    /// Builds a registry from an explicit module map.
    #[must_use]
    pub fn new(modules: BTreeMap<String, ModuleConfig>) -> Self {
        Self { modules }
    }

    /// Deserializes a registry from a configuration document of the shape
    /// `{ "<module>": { "enabled": bool, "auto_record": bool,
    /// "aggregates": { "<name>": { "observer": "...", ... } } } }`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when the document does not match
    /// the expected shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DomainError> {
        let modules: BTreeMap<String, ModuleConfig> = serde_json::from_value(value)
            .map_err(|e| DomainError::Validation(format!("invalid module configuration: {e}")))?;
        Ok(Self { modules })
    }

    /// Whether event sourcing is enabled for the module. Unknown modules
    /// are disabled.
    #[must_use]
    pub fn is_enabled(&self, module: &str) -> bool {
        self.modules.get(module).is_some_and(|m| m.enabled)
    }

    /// Whether auto-recording is enabled for the module. Always false for
    /// disabled or unknown modules.
    #[must_use]
    pub fn is_auto_record_enabled(&self, module: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|m| m.enabled && m.auto_record)
    }

    /// The aggregate names configured for an enabled module, in stable
    /// order. Empty for disabled or unknown modules.
    #[must_use]
    pub fn enabled_aggregates(&self, module: &str) -> Vec<&str> {
        self.modules
            .get(module)
            .filter(|m| m.enabled)
            .map(|m| m.aggregates.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The observer name configured for an aggregate of an enabled module.
    #[must_use]
    pub fn observer(&self, module: &str, aggregate: &str) -> Option<&str> {
        self.modules
            .get(module)
            .filter(|m| m.enabled)
            .and_then(|m| m.aggregates.get(aggregate))
            .map(|a| a.observer.as_str())
    }
}
