use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use estimate_core::db::repository::validate_record;
use estimate_core::{EstimateRecord, LineItem, SheetStore, SheetSummary, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal};

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

pub struct SqliteSheetStore {
    pool: SqlitePool,
}

impl SqliteSheetStore {
    /// Open `database_url`, creating the file if needed.
    ///
    /// Accepts a sqlx URL (`sqlite:estimates.db`, `sqlite::memory:`), the
    /// bare `:memory:` shorthand or a plain file path.
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = matches!(database_url, ":memory:" | "sqlite::memory:");
        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)
                .with_context(|| format!("Invalid database URL: {}", database_url))?
                .create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .filename(database_url)
                .create_if_missing(true)
        };

        let pool = Self::pool_options(in_memory)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    /// An in-memory database lives only as long as its connection, so that
    /// pool holds exactly one and never retires it.
    fn pool_options(in_memory: bool) -> SqlitePoolOptions {
        if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        }
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn sheet_id_at(
        tx: &mut Transaction<'_, Sqlite>,
        index: usize,
    ) -> Result<Option<(i64, bool)>, StoreError> {
        let row = sqlx::query("SELECT id, is_active FROM sheets ORDER BY position LIMIT 1 OFFSET ?")
            .bind(index as i64)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?;

        row.map(|row| {
            Ok((
                row.try_get("id").map_err(db_error)?,
                row.try_get("is_active").map_err(db_error)?,
            ))
        })
        .transpose()
    }

    async fn load_line_items(
        &self,
        sheet_id: i64,
    ) -> Result<Vec<LineItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT description, materials,
                    engineering_hours, production_hours, finish_hours, installation_hours,
                    engineering_cost, production_cost, finish_cost, installation_cost,
                    total_cost
             FROM line_items WHERE sheet_id = ? ORDER BY position",
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_line_item).collect()
    }
}

fn row_to_line_item(row: &sqlx::sqlite::SqliteRow) -> Result<LineItem, StoreError> {
    Ok(LineItem {
        description: row.try_get("description").map_err(db_error)?,
        materials: get_decimal(row, "materials")?,
        engineering_hours: get_decimal(row, "engineering_hours")?,
        production_hours: get_decimal(row, "production_hours")?,
        finish_hours: get_decimal(row, "finish_hours")?,
        installation_hours: get_decimal(row, "installation_hours")?,
        engineering_cost: get_decimal(row, "engineering_cost")?,
        production_cost: get_decimal(row, "production_cost")?,
        finish_cost: get_decimal(row, "finish_cost")?,
        installation_cost: get_decimal(row, "installation_cost")?,
        total_cost: get_decimal(row, "total_cost")?,
    })
}

#[async_trait]
impl SheetStore for SqliteSheetStore {
    async fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        let rows = sqlx::query("SELECT name, is_active FROM sheets ORDER BY position")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                Ok(SheetSummary {
                    name: row.try_get("name").map_err(db_error)?,
                    index,
                    is_active: row.try_get("is_active").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn create(
        &self,
        title: &str,
        record: &EstimateRecord,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        validate_record(record)?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let exists = sqlx::query("SELECT 1 FROM sheets WHERE name = ?")
            .bind(title)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if exists.is_some() {
            return Err(StoreError::DuplicateSheet(title.to_string()));
        }

        sqlx::query("UPDATE sheets SET is_active = 0")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let result = sqlx::query(
            "INSERT INTO sheets (name, position, customer_name, estimate_name, estimate_date, is_active)
             VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM sheets), ?, ?, ?, 1)",
        )
        .bind(title)
        .bind(&record.customer_name)
        .bind(&record.estimate_name)
        .bind(record.date)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        let sheet_id = result.last_insert_rowid();

        for (position, item) in record.line_items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO line_items (
                    sheet_id, position, description, materials,
                    engineering_hours, production_hours, finish_hours, installation_hours,
                    engineering_cost, production_cost, finish_cost, installation_cost,
                    total_cost
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(sheet_id)
            .bind(position as i64)
            .bind(&item.description)
            .bind(decimal_to_text(item.materials))
            .bind(decimal_to_text(item.engineering_hours))
            .bind(decimal_to_text(item.production_hours))
            .bind(decimal_to_text(item.finish_hours))
            .bind(decimal_to_text(item.installation_hours))
            .bind(decimal_to_text(item.engineering_cost))
            .bind(decimal_to_text(item.production_cost))
            .bind(decimal_to_text(item.finish_cost))
            .bind(decimal_to_text(item.installation_cost))
            .bind(decimal_to_text(item.total_cost))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        info!(sheet = title, items = record.line_items.len(), "sheet created");

        self.list().await
    }

    async fn delete(
        &self,
        index: usize,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let (sheet_id, was_active) = Self::sheet_id_at(&mut tx, index)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("index {index}")))?;

        sqlx::query("DELETE FROM line_items WHERE sheet_id = ?")
            .bind(sheet_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM sheets WHERE id = ?")
            .bind(sheet_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if was_active {
            sqlx::query(
                "UPDATE sheets SET is_active = 1
                 WHERE id = (SELECT id FROM sheets ORDER BY position LIMIT 1)",
            )
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        info!(index, sheet_id, "sheet deleted");

        self.list().await
    }

    async fn set_active(
        &self,
        name: &str,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query("UPDATE sheets SET is_active = (name = ?)")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let found = sqlx::query("SELECT 1 FROM sheets WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        if found.is_none() {
            // Dropping the transaction rolls the flag change back.
            return Err(StoreError::NotFound(name.to_string()));
        }

        tx.commit().await.map_err(db_error)?;
        debug!(sheet = name, rows = result.rows_affected(), "active sheet changed");

        self.list().await
    }

    async fn active_record(&self) -> Result<Option<EstimateRecord>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, customer_name, estimate_name, estimate_date
             FROM sheets WHERE is_active = 1 ORDER BY position LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        else {
            return Ok(None);
        };

        let sheet_id: i64 = row.try_get("id").map_err(db_error)?;
        let record = EstimateRecord {
            customer_name: row.try_get("customer_name").map_err(db_error)?,
            estimate_name: row.try_get("estimate_name").map_err(db_error)?,
            date: row
                .try_get::<NaiveDate, _>("estimate_date")
                .map_err(|e| StoreError::Database(format!("Failed to get estimate_date: {}", e)))?,
            line_items: self.load_line_items(sheet_id).await?,
        };

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use estimate_core::{CostConfig, Estimate, PhaseHours};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteSheetStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let store = SqliteSheetStore::new_with_pool(pool).await;
        store
            .run_migrations()
            .await
            .expect("Failed to run migrations");
        store
    }

    fn record(customer: &str) -> EstimateRecord {
        let config = CostConfig::default();
        EstimateRecord {
            customer_name: customer.to_string(),
            estimate_name: "42".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            line_items: vec![
                config.price(
                    "Canopy",
                    dec!(50),
                    PhaseHours {
                        engineering: dec!(2),
                        production: dec!(1),
                        ..Default::default()
                    },
                ),
                config.price(
                    "Anchors",
                    dec!(12.345),
                    PhaseHours {
                        installation: dec!(0.75),
                        ..Default::default()
                    },
                ),
            ],
        }
    }

    fn names(sheets: &[SheetSummary]) -> Vec<&str> {
        sheets.iter().map(|s| s.name.as_str()).collect()
    }

    fn active(sheets: &[SheetSummary]) -> Option<&str> {
        sheets.iter().find(|s| s.is_active).map(|s| s.name.as_str())
    }

    #[tokio::test]
    async fn empty_database_lists_nothing() {
        let store = setup_test_db().await;

        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.active_estimate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_round_trips_line_items_exactly() {
        let store = setup_test_db().await;
        let original = record("Acme");

        let sheets = store.create("Acme-42", &original).await.unwrap();
        let loaded = store.active_estimate().await.unwrap().unwrap();

        assert_eq!(names(&sheets), vec!["Acme-42"]);
        assert!(sheets[0].is_active);
        assert_eq!(loaded, Estimate::from(original));
        assert_eq!(loaded.line_items[1].materials, dec!(12.345));
        assert_eq!(loaded.total(), dec!(437.345));
    }

    #[test]
    fn in_memory_pool_never_retires_its_connection() {
        let options = SqliteSheetStore::pool_options(true);

        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[test]
    fn file_pool_keeps_sqlx_timeouts() {
        let options = SqliteSheetStore::pool_options(false);

        assert_eq!(options.get_max_connections(), 5);
        assert!(options.get_idle_timeout().is_some());
    }

    #[tokio::test]
    async fn in_memory_url_keeps_data_across_calls() {
        let store = SqliteSheetStore::new(":memory:").await.unwrap();
        store.run_migrations().await.unwrap();
        store.create("Acme-42", &record("Acme")).await.unwrap();

        assert_eq!(names(&store.list().await.unwrap()), vec!["Acme-42"]);
        assert_eq!(store.pool().size(), 1);
    }

    #[tokio::test]
    async fn active_record_keeps_submission_date() {
        let store = setup_test_db().await;
        let original = record("Acme");
        store.create("Acme-42", &original).await.unwrap();

        let loaded = store.active_record().await.unwrap().unwrap();

        assert_eq!(loaded.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn create_orders_sheets_and_activates_newest() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();
        store.create("B", &record("B")).await.unwrap();
        let sheets = store.create("C", &record("C")).await.unwrap();

        assert_eq!(names(&sheets), vec!["A", "B", "C"]);
        assert_eq!(sheets.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(active(&sheets), Some("C"));
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_missing_data() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();

        assert_eq!(
            store.create("A", &record("A")).await,
            Err(StoreError::DuplicateSheet("A".to_string()))
        );
        assert!(matches!(
            store.create("B", &record("  ")).await,
            Err(StoreError::MissingData(_))
        ));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_active_activates_first_remaining() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();
        store.create("B", &record("B")).await.unwrap();

        let sheets = store.delete(1).await.unwrap();

        assert_eq!(names(&sheets), vec!["A"]);
        assert_eq!(active(&sheets), Some("A"));
        assert_eq!(store.active_estimate().await.unwrap().unwrap().customer, "A");
    }

    #[tokio::test]
    async fn delete_reindexes_remaining_sheets() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();
        store.create("B", &record("B")).await.unwrap();

        let sheets = store.delete(0).await.unwrap();

        assert_eq!(names(&sheets), vec!["B"]);
        assert_eq!(sheets[0].index, 0);
        assert_eq!(active(&sheets), Some("B"));
    }

    #[tokio::test]
    async fn delete_last_sheet_leaves_no_active_estimate() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();

        assert!(store.delete(0).await.unwrap().is_empty());
        assert_eq!(store.active_estimate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_out_of_range_is_not_found() {
        let store = setup_test_db().await;

        assert!(matches!(store.delete(3).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn set_active_switches_sheet() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();
        store.create("B", &record("B")).await.unwrap();

        let sheets = store.set_active("A").await.unwrap();

        assert_eq!(active(&sheets), Some("A"));
        assert_eq!(store.active_estimate().await.unwrap().unwrap().customer, "A");
    }

    #[tokio::test]
    async fn set_active_unknown_keeps_current_sheet() {
        let store = setup_test_db().await;
        store.create("A", &record("A")).await.unwrap();

        assert_eq!(
            store.set_active("Z").await,
            Err(StoreError::NotFound("Z".to_string()))
        );
        assert_eq!(active(&store.list().await.unwrap()), Some("A"));
    }
}
