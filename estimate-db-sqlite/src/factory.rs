use async_trait::async_trait;

use estimate_core::db::{SheetStore, StoreConfig, StoreError, StoreFactory};

use crate::repository::SqliteSheetStore;

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`estimate_core::db::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use estimate_core::db::StoreRegistry;
/// use estimate_db_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"estimates.db"`.  The file is created if
    ///   it does not exist.
    /// * A sqlx URL, e.g. `"sqlite:estimates.db"`.
    /// * `":memory:"` for an ephemeral in-memory database.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn SheetStore>, StoreError> {
        let store = SqliteSheetStore::new(&config.connection_string)
            .await
            .map_err(|e| StoreError::Connection(format!("{e:#}")))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;
        Ok(Box::new(store))
    }
}

#[cfg(test)]
mod tests {
    use estimate_core::db::{SheetStore, StoreConfig, StoreFactory};

    use super::SqliteStoreFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteStoreFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_in_memory_store() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let store = SqliteStoreFactory
            .create(&config)
            .await
            .expect("failed to create in-memory store");

        assert!(store.list().await.unwrap().is_empty());
    }
}
