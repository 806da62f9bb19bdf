//! Spreadsheet layout of an estimate sheet.
//!
//! | Row | Contents |
//! |-----|----------|
//! | 1   | [`SHEET_HEADERS`] |
//! | 2   | customer name, estimate name, date; remaining cells blank |
//! | 3.. | one line item per row, first three cells blank |
//!
//! Only materials and hours are written; costs are derived again when a
//! sheet is read back.

use std::io::{Read, Write};

use chrono::NaiveDate;
use estimate_core::calculations::parse_number;
use estimate_core::{CostConfig, EstimateRecord, LineItem, Phase, PhaseHours};
use thiserror::Error;

pub const SHEET_HEADERS: [&str; 9] = [
    "Customer Name",
    "Estimate Name",
    "Date",
    "Description",
    "Materials",
    "Engineering Hours",
    "Production Hours",
    "Finish Hours",
    "Installation Hours",
];

/// Date cell format, e.g. `Mon Jun 03 2024`.
const DATE_FORMAT: &str = "%a %b %d %Y";

#[derive(Debug, Error)]
pub enum SheetLayoutError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheet does not start with the estimate header row")]
    MissingHeader,

    #[error("sheet has no customer row")]
    MissingCustomerRow,

    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

pub struct SheetLayout;

impl SheetLayout {
    /// Cell values for every row of the sheet, header first.
    pub fn rows(record: &EstimateRecord) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(record.line_items.len() + 2);
        rows.push(SHEET_HEADERS.iter().map(|h| h.to_string()).collect());

        let mut customer_row = vec![
            record.customer_name.clone(),
            record.estimate_name.clone(),
            record.date.format(DATE_FORMAT).to_string(),
        ];
        customer_row.resize(SHEET_HEADERS.len(), String::new());
        rows.push(customer_row);

        rows.extend(record.line_items.iter().map(item_row));
        rows
    }

    pub fn write_csv<W: Write>(
        record: &EstimateRecord,
        writer: W,
    ) -> Result<(), SheetLayoutError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in Self::rows(record) {
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Read a sheet written by [`SheetLayout::write_csv`], pricing each line
    /// item with `config`.
    pub fn read_csv<R: Read>(
        reader: R,
        config: &CostConfig,
    ) -> Result<EstimateRecord, SheetLayoutError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = csv_reader.records();

        let header = records.next().ok_or(SheetLayoutError::MissingHeader)??;
        if !header.iter().eq(SHEET_HEADERS.iter().copied()) {
            return Err(SheetLayoutError::MissingHeader);
        }

        let customer = records.next().ok_or(SheetLayoutError::MissingCustomerRow)??;
        let cell = |i: usize| customer.get(i).unwrap_or_default().to_string();
        let date_text = cell(2);
        let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT)
            .map_err(|_| SheetLayoutError::InvalidDate(date_text.clone()))?;

        let mut line_items = Vec::new();
        for row in records {
            let row = row?;
            let field = |i: usize| row.get(i).unwrap_or_default();
            let mut hours = PhaseHours::default();
            for (offset, phase) in Phase::ALL.into_iter().enumerate() {
                hours.set(phase, parse_number(field(5 + offset)));
            }
            line_items.push(config.price(field(3), parse_number(field(4)), hours));
        }

        Ok(EstimateRecord {
            customer_name: cell(0),
            estimate_name: cell(1),
            date,
            line_items,
        })
    }
}

fn item_row(item: &LineItem) -> Vec<String> {
    let mut row = vec![
        String::new(),
        String::new(),
        String::new(),
        item.description.clone(),
        item.materials.to_string(),
    ];
    row.extend(Phase::ALL.iter().map(|phase| item.hours(*phase).to_string()));
    row
}
