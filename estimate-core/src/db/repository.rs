use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Estimate, EstimateRecord, SheetSummary};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Sheet not found: {0}")]
    NotFound(String),

    #[error("Missing required data for creating a sheet: {0}")]
    MissingData(String),

    #[error("A sheet named '{0}' already exists")]
    DuplicateSheet(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A workbook of named estimate sheets.
///
/// Every mutating call returns the store's listing after the change so
/// callers never have to issue a second `list`.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SheetSummary>, StoreError>;

    /// Insert a sheet called `title` holding `record`. The new sheet
    /// becomes the active one.
    async fn create(
        &self,
        title: &str,
        record: &EstimateRecord,
    ) -> Result<Vec<SheetSummary>, StoreError>;

    /// Remove the sheet at zero-based `index`. If it was active, the first
    /// remaining sheet becomes active.
    async fn delete(
        &self,
        index: usize,
    ) -> Result<Vec<SheetSummary>, StoreError>;

    async fn set_active(
        &self,
        name: &str,
    ) -> Result<Vec<SheetSummary>, StoreError>;

    /// Everything stored on the active sheet, submission date included.
    async fn active_record(&self) -> Result<Option<EstimateRecord>, StoreError>;

    /// The estimate stored on the active sheet, if there is one.
    async fn active_estimate(&self) -> Result<Option<Estimate>, StoreError> {
        Ok(self.active_record().await?.map(Estimate::from))
    }
}

/// Checks the fields a store needs before it writes a sheet.
pub fn validate_record(record: &EstimateRecord) -> Result<(), StoreError> {
    let mut missing = Vec::new();
    if record.customer_name.trim().is_empty() {
        missing.push("customer name");
    }
    if record.estimate_name.trim().is_empty() {
        missing.push("estimate name");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::MissingData(missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(
        customer: &str,
        estimate: &str,
    ) -> EstimateRecord {
        EstimateRecord {
            customer_name: customer.to_string(),
            estimate_name: estimate.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            line_items: Vec::new(),
        }
    }

    #[test]
    fn complete_record_passes() {
        assert_eq!(validate_record(&record("Acme", "E-1")), Ok(()));
    }

    #[test]
    fn blank_names_are_reported_together() {
        assert_eq!(
            validate_record(&record(" ", "")),
            Err(StoreError::MissingData(
                "customer name, estimate name".to_string()
            ))
        );
    }
}
