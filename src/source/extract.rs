//! Typed column extraction from Arrow record batches.
//!
//! Adapters read whole columns at a time: presence of the required set is
//! validated up front (fail fast with a named missing column), then each
//! column is pulled as a vector of optionals. Value coercion is lossy by
//! design: a cell that cannot be read as the expected type becomes `None`
//! and is dropped and counted by the caller, never an error.

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};

/// Check that every required column exists, before any row work.
pub fn validate_columns(batch: &RecordBatch, table: &str, required: &[&str]) -> Result<()> {
    let schema = batch.schema();
    for column in required {
        if schema.index_of(column).is_err() {
            return Err(Error::ColumnNotFound {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

/// Read a string column. Only Utf8 columns are accepted; identifiers and
/// names never arrive as anything else in these sources.
pub fn string_column(
    batch: &RecordBatch,
    table: &str,
    column: &str,
) -> Result<Vec<Option<String>>> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| Error::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })?;
    let strings = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::ColumnType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "Utf8",
            actual: format!("{:?}", array.data_type()),
        })?;
    Ok((0..strings.len())
        .map(|row| {
            if strings.is_null(row) {
                None
            } else {
                Some(strings.value(row).to_string())
            }
        })
        .collect())
}

/// Read a string column that may legitimately be absent (stratification
/// flags that only some releases of a source carry).
pub fn optional_string_column(
    batch: &RecordBatch,
    table: &str,
    column: &str,
) -> Result<Option<Vec<Option<String>>>> {
    if batch.schema().index_of(column).is_err() {
        return Ok(None);
    }
    string_column(batch, table, column).map(Some)
}

/// Read a metric column as `f64`, coercing lossily.
///
/// Numeric columns are cast through Arrow; string columns are parsed
/// per-cell. Unparseable or null cells become `None`.
pub fn float_column(batch: &RecordBatch, table: &str, column: &str) -> Result<Vec<Option<f64>>> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| Error::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })?;

    match array.data_type() {
        DataType::Utf8 => {
            let strings = string_column(batch, table, column)?;
            Ok(strings
                .into_iter()
                .map(|cell| cell.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect())
        }
        data_type if data_type.is_numeric() => {
            let floats = cast(array, &DataType::Float64)?;
            let floats = floats
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::ColumnType {
                    table: table.to_string(),
                    column: column.to_string(),
                    expected: "Float64",
                    actual: format!("{:?}", array.data_type()),
                })?;
            Ok((0..floats.len())
                .map(|row| {
                    if floats.is_null(row) {
                        None
                    } else {
                        Some(floats.value(row))
                    }
                })
                .collect())
        }
        other => Err(Error::ColumnType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "numeric or Utf8",
            actual: format!("{other:?}"),
        }),
    }
}

/// Read a year column as `i32`, coercing lossily.
///
/// Some releases ship years as integers, some as floats, some as strings;
/// all three are accepted. A fractional or unparseable year becomes `None`.
pub fn year_column(batch: &RecordBatch, table: &str, column: &str) -> Result<Vec<Option<i32>>> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| Error::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })?;

    match array.data_type() {
        DataType::Utf8 => {
            let strings = string_column(batch, table, column)?;
            Ok(strings
                .into_iter()
                .map(|cell| cell.and_then(|s| parse_year(s.trim())))
                .collect())
        }
        data_type if data_type.is_numeric() => {
            let ints = cast(array, &DataType::Int64)?;
            let ints = ints
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| Error::ColumnType {
                    table: table.to_string(),
                    column: column.to_string(),
                    expected: "Int64",
                    actual: format!("{:?}", array.data_type()),
                })?;
            Ok((0..ints.len())
                .map(|row| {
                    if ints.is_null(row) {
                        None
                    } else {
                        i32::try_from(ints.value(row)).ok()
                    }
                })
                .collect())
        }
        other => Err(Error::ColumnType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "numeric or Utf8",
            actual: format!("{other:?}"),
        }),
    }
}

fn parse_year(text: &str) -> Option<i32> {
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    // Some exports write years as "2019.0"
    let float = text.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.abs() < f64::from(i32::MAX) {
        Some(float as i32)
    } else {
        None
    }
}
