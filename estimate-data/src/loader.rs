//! CSV import of line items.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter. Every column
//! except `description` may be omitted.
//!
//! | Column               | Notes                                   |
//! |----------------------|-----------------------------------------|
//! | `description`        | free text                               |
//! | `materials`          | materials cost, e.g. `1,250.00`         |
//! | `engineering_hours`  | hours                                   |
//! | `production_hours`   | hours                                   |
//! | `finish_hours`       | hours                                   |
//! | `installation_hours` | hours                                   |
//!
//! Number cells are read the way the form reads typed input: blank or
//! non-numeric text counts as zero.
//!
//! ```csv
//! description,materials,engineering_hours,production_hours,finish_hours,installation_hours
//! Entry canopy,50,2,1,0,0
//! ```

use std::io::Read;

use chrono::NaiveDate;
use estimate_core::{EstimateForm, FormError, FormField, Phase, SheetStore, SheetSummary};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while importing line items.
#[derive(Debug, Error)]
pub enum LineItemLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error(transparent)]
    Form(#[from] FormError),
}

impl From<csv::Error> for LineItemLoaderError {
    fn from(err: csv::Error) -> Self {
        LineItemLoaderError::CsvParse(err.to_string())
    }
}

/// One CSV row, kept as text until it is fed through the form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LineItemRecord {
    pub description: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub engineering_hours: String,
    #[serde(default)]
    pub production_hours: String,
    #[serde(default)]
    pub finish_hours: String,
    #[serde(default)]
    pub installation_hours: String,
}

impl LineItemRecord {
    fn hours(
        &self,
        phase: Phase,
    ) -> &str {
        match phase {
            Phase::Engineering => &self.engineering_hours,
            Phase::Production => &self.production_hours,
            Phase::Finish => &self.finish_hours,
            Phase::Installation => &self.installation_hours,
        }
    }
}

/// Reads line items from CSV and enters them through an [`EstimateForm`],
/// so imported rows are priced exactly like typed ones.
pub struct LineItemLoader;

impl LineItemLoader {
    /// Parse records from any reader, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LineItemRecord>, LineItemLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            let record: LineItemRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Commit each record to `form` as a new line item. Returns how many
    /// items were added.
    pub fn apply(
        form: &mut EstimateForm,
        records: &[LineItemRecord],
    ) -> usize {
        for record in records {
            form.set_field(FormField::Description, record.description.as_str());
            form.set_field(FormField::Materials, record.materials.as_str());
            for phase in Phase::ALL {
                form.on_hours_change(phase, record.hours(phase));
            }
            let index = form.commit_line_item();
            debug!(index, description = %record.description, "imported line item");
        }
        records.len()
    }

    /// Build an estimate from `records` and submit it to `store` as a new
    /// sheet.
    pub async fn load(
        store: &dyn SheetStore,
        form: &mut EstimateForm,
        customer: &str,
        estimate_number: &str,
        date: NaiveDate,
        records: &[LineItemRecord],
    ) -> Result<Vec<SheetSummary>, LineItemLoaderError> {
        form.set_field(FormField::Customer, customer);
        form.set_field(FormField::EstimateNumber, estimate_number);
        form.validate()?;

        Self::apply(form, records);
        Ok(form.submit(store, date).await?)
    }
}
