// Conversion module - the adapter and converter registries
//
// This module is split into sub-modules:
// - adapt: host values -> wire (JSON) values, applied before sending parameters
// - convert: wire values -> host values, resolved per result column

pub mod adapt;
pub mod convert;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard};

use serde_json::Value as JsonValue;

use crate::error::RqliteDbError;
use crate::types::{SqlValue, ValueKind};

pub use convert::{WireValue, converter_for};

/// Adapter: host value -> wire-representable JSON value.
pub type AdapterFn = Arc<dyn Fn(&SqlValue) -> Result<JsonValue, RqliteDbError> + Send + Sync>;

/// Converter: wire value -> host value.
pub type ConverterFn = Arc<dyn Fn(WireValue<'_>) -> Result<SqlValue, RqliteDbError> + Send + Sync>;

/// Registry of value adapters and type converters.
///
/// A fresh registry carries the stock converters (`UNICODE`, `BOOL`, `FLOAT`,
/// `DATE`, `TIMESTAMP`) and no adapter overrides; the built-in adaptation
/// rules live in [`adapt`] and apply whenever no override is registered for a
/// value kind. Connections share one process-wide default instance unless
/// configured with a private registry, so the module-level
/// [`register_converter`]/[`register_adapter`] calls keep the global-override
/// ergonomics of the embedded driver.
pub struct TypeRegistry {
    adapters: HashMap<ValueKind, AdapterFn>,
    converters: HashMap<String, ConverterFn>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .field("converters", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            adapters: HashMap::new(),
            converters: convert::builtin_converters(),
        }
    }
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or override) an adapter for a host value kind.
    pub fn register_adapter<F>(&mut self, kind: ValueKind, adapter: F)
    where
        F: Fn(&SqlValue) -> Result<JsonValue, RqliteDbError> + Send + Sync + 'static,
    {
        self.adapters.insert(kind, Arc::new(adapter));
    }

    /// Remove a registered adapter, restoring the built-in behavior.
    pub fn deregister_adapter(&mut self, kind: ValueKind) -> Option<AdapterFn> {
        self.adapters.remove(&kind)
    }

    /// Register (or override) a converter for a declared type or column-name
    /// hint. Keys are case-insensitive.
    pub fn register_converter<F>(&mut self, type_name: &str, converter: F)
    where
        F: Fn(WireValue<'_>) -> Result<SqlValue, RqliteDbError> + Send + Sync + 'static,
    {
        self.converters
            .insert(type_name.to_uppercase(), Arc::new(converter));
    }

    /// Remove a registered converter.
    pub fn deregister_converter(&mut self, type_name: &str) -> Option<ConverterFn> {
        self.converters.remove(&type_name.to_uppercase())
    }

    /// Restore the stock converters and drop all adapter overrides.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn adapter(&self, kind: ValueKind) -> Option<AdapterFn> {
        self.adapters.get(&kind).cloned()
    }

    pub(crate) fn converter(&self, key: &str) -> Option<ConverterFn> {
        self.converters.get(key).cloned()
    }
}

static DEFAULT_REGISTRY: LazyLock<Arc<RwLock<TypeRegistry>>> =
    LazyLock::new(|| Arc::new(RwLock::new(TypeRegistry::default())));

/// Handle to the process-wide default registry shared by all connections
/// that were not configured with a private registry.
#[must_use]
pub fn default_registry() -> Arc<RwLock<TypeRegistry>> {
    DEFAULT_REGISTRY.clone()
}

pub(crate) fn read_registry(registry: &RwLock<TypeRegistry>) -> RwLockReadGuard<'_, TypeRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

/// Register a converter in the process-wide default registry.
pub fn register_converter<F>(type_name: &str, converter: F)
where
    F: Fn(WireValue<'_>) -> Result<SqlValue, RqliteDbError> + Send + Sync + 'static,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register_converter(type_name, converter);
}

/// Register an adapter in the process-wide default registry.
pub fn register_adapter<F>(kind: ValueKind, adapter: F)
where
    F: Fn(&SqlValue) -> Result<JsonValue, RqliteDbError> + Send + Sync + 'static,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register_adapter(kind, adapter);
}

/// Remove a converter from the process-wide default registry.
pub fn deregister_converter(type_name: &str) {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .deregister_converter(type_name);
}

/// Remove an adapter from the process-wide default registry.
pub fn deregister_adapter(kind: ValueKind) {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .deregister_adapter(kind);
}

/// Restore the process-wide default registry to its stock state. Intended
/// for test isolation after `register_*` calls.
pub fn reset_registry() {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .reset();
}
