//! In-process [`SheetStore`], the default backend and the test double for
//! everything built on top of the store trait.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::info;

use super::factory::{StoreConfig, StoreFactory};
use super::repository::{SheetStore, StoreError, validate_record};
use crate::models::{EstimateRecord, SheetSummary};

#[derive(Debug, Default)]
struct Workbook {
    sheets: Vec<(String, EstimateRecord)>,
    active: Option<String>,
}

impl Workbook {
    fn summaries(&self) -> Vec<SheetSummary> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(index, (name, _))| SheetSummary {
                name: name.clone(),
                index,
                is_active: self.active.as_deref() == Some(name.as_str()),
            })
            .collect()
    }
}

/// Sheets held in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    workbook: Mutex<Workbook>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn workbook(&self) -> Result<MutexGuard<'_, Workbook>, StoreError> {
        self.workbook
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        Ok(self.workbook()?.summaries())
    }

    async fn create(
        &self,
        title: &str,
        record: &EstimateRecord,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        validate_record(record)?;

        let mut workbook = self.workbook()?;
        if workbook.sheets.iter().any(|(name, _)| name == title) {
            return Err(StoreError::DuplicateSheet(title.to_string()));
        }

        workbook.sheets.push((title.to_string(), record.clone()));
        workbook.active = Some(title.to_string());
        info!(sheet = title, items = record.line_items.len(), "sheet created");

        Ok(workbook.summaries())
    }

    async fn delete(
        &self,
        index: usize,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        let mut workbook = self.workbook()?;
        if index >= workbook.sheets.len() {
            return Err(StoreError::NotFound(format!("index {index}")));
        }

        let (name, _) = workbook.sheets.remove(index);
        if workbook.active.as_deref() == Some(name.as_str()) {
            workbook.active = workbook.sheets.first().map(|(first, _)| first.clone());
        }
        info!(sheet = %name, "sheet deleted");

        Ok(workbook.summaries())
    }

    async fn set_active(
        &self,
        name: &str,
    ) -> Result<Vec<SheetSummary>, StoreError> {
        let mut workbook = self.workbook()?;
        if !workbook.sheets.iter().any(|(sheet, _)| sheet == name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        workbook.active = Some(name.to_string());

        Ok(workbook.summaries())
    }

    async fn active_record(&self) -> Result<Option<EstimateRecord>, StoreError> {
        let workbook = self.workbook()?;
        let Some(active) = workbook.active.as_deref() else {
            return Ok(None);
        };

        Ok(workbook
            .sheets
            .iter()
            .find(|(name, _)| name == active)
            .map(|(_, record)| record.clone()))
    }
}

/// [`StoreFactory`] for the `"memory"` backend. The connection string is
/// ignored; every `create` yields a fresh, empty store.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Box<dyn SheetStore>, StoreError> {
        Ok(Box::new(MemorySheetStore::new()))
    }
}
