use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{SheetStore, StoreError};

/// Backend-agnostic store configuration.
///
/// `backend` must match the [`StoreFactory::backend_name`] of a registered
/// factory.  `connection_string` is passed through to that factory
/// unchanged; its meaning is entirely backend-specific.
///
/// | backend    | connection_string examples                 |
/// |------------|--------------------------------------------|
/// | `memory`   | ignored                                    |
/// | `sqlite`   | `estimates.db`, `sqlite::memory:`          |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

/// One implementation per storage backend.  Each backend exports a single
/// unit struct that implements this trait and is registered with a
/// [`StoreRegistry`] at startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the store and return it ready to use.
    /// Implementations are free to run migrations inside this method.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn SheetStore>, StoreError>;
}

/// Registry of [`StoreFactory`] instances, keyed by backend name.
///
/// Typical lifetime:
/// 1. Create with `StoreRegistry::new()`.
/// 2. Call `register` once per known backend.
/// 3. Call `create` whenever a store is needed.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any previous one with the same
    /// [`StoreFactory::backend_name`].
    pub fn register(
        &mut self,
        factory: Box<dyn StoreFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`StoreError::Configuration`]: no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn SheetStore>, StoreError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
