use std::str::FromStr;

use estimate_core::StoreError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal value from a row.
///
/// Values written by this crate are TEXT; INTEGER and REAL are accepted for
/// rows edited by hand.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, StoreError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| StoreError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(val.trim()).map_err(|e| {
                StoreError::Database(format!("Invalid decimal '{}' in '{}': {}", val, column, e))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get INTEGER from '{}': {}", column, e))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                StoreError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        _ => Err(StoreError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Text form used for every decimal column.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}
