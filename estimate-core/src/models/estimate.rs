use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LineItem;

/// A finished estimate as produced by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub customer: String,
    pub estimate_number: String,
    pub line_items: Vec<LineItem>,
}

impl Estimate {
    /// Name of the sheet an estimate is stored under: `customer-number`.
    pub fn sheet_title(&self) -> String {
        format!("{}-{}", self.customer, self.estimate_number)
    }

    pub fn total(&self) -> Decimal {
        self.line_items.iter().map(|item| item.total_cost).sum()
    }

    /// Stamp the estimate with a submission date for the sheet store.
    pub fn into_record(
        self,
        date: NaiveDate,
    ) -> EstimateRecord {
        EstimateRecord {
            customer_name: self.customer,
            estimate_name: self.estimate_number,
            date,
            line_items: self.line_items,
        }
    }
}

/// What a sheet store persists for one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRecord {
    pub customer_name: String,
    pub estimate_name: String,
    pub date: NaiveDate,
    pub line_items: Vec<LineItem>,
}

impl From<EstimateRecord> for Estimate {
    fn from(record: EstimateRecord) -> Self {
        Self {
            customer: record.customer_name,
            estimate_number: record.estimate_name,
            line_items: record.line_items,
        }
    }
}
