//! Shared fixtures: in-memory record batches shaped like the six raw
//! source exports.

#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

fn batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> RecordBatch {
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

fn strings(values: Vec<Option<&str>>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn ints(values: Vec<Option<i64>>) -> ArrayRef {
    Arc::new(Int64Array::from(values))
}

fn floats(values: Vec<Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

/// OWID-shaped batch: `(Entity, Code, Year, Life expectancy)`
pub fn owid_batch(rows: &[(&str, Option<&str>, i64, Option<f64>)]) -> RecordBatch {
    batch(
        vec![
            Field::new("Entity", DataType::Utf8, true),
            Field::new("Code", DataType::Utf8, true),
            Field::new("Year", DataType::Int64, true),
            Field::new("Life expectancy", DataType::Float64, true),
        ],
        vec![
            strings(rows.iter().map(|(n, ..)| Some(*n)).collect()),
            strings(rows.iter().map(|(_, c, ..)| *c).collect()),
            ints(rows.iter().map(|(_, _, y, _)| Some(*y)).collect()),
            floats(rows.iter().map(|(.., v)| *v).collect()),
        ],
    )
}

/// World-Bank-shaped batch: `(iso3, year, life_exp_wb)`
pub fn worldbank_batch(rows: &[(Option<&str>, i64, Option<f64>)]) -> RecordBatch {
    batch(
        vec![
            Field::new("iso3", DataType::Utf8, true),
            Field::new("year", DataType::Int64, true),
            Field::new("life_exp_wb", DataType::Float64, true),
        ],
        vec![
            strings(rows.iter().map(|(c, ..)| *c).collect()),
            ints(rows.iter().map(|(_, y, _)| Some(*y)).collect()),
            floats(rows.iter().map(|(.., v)| *v).collect()),
        ],
    )
}

/// Kaggle-shaped batch: `(Country, Year, Life expectancy)`
pub fn kaggle_batch(rows: &[(&str, i64, Option<f64>)]) -> RecordBatch {
    batch(
        vec![
            Field::new("Country", DataType::Utf8, true),
            Field::new("Year", DataType::Int64, true),
            Field::new("Life expectancy", DataType::Float64, true),
        ],
        vec![
            strings(rows.iter().map(|(n, ..)| Some(*n)).collect()),
            ints(rows.iter().map(|(_, y, _)| Some(*y)).collect()),
            floats(rows.iter().map(|(.., v)| *v).collect()),
        ],
    )
}

/// UNICEF-shaped batch with the SDMX `SEX` dimension and string-typed
/// observation values: `(SEX, REF_AREA, TIME_PERIOD, OBS_VALUE)`
pub fn unicef_batch(rows: &[(&str, &str, i64, &str)]) -> RecordBatch {
    batch(
        vec![
            Field::new("SEX", DataType::Utf8, true),
            Field::new("REF_AREA", DataType::Utf8, true),
            Field::new("TIME_PERIOD", DataType::Int64, true),
            Field::new("OBS_VALUE", DataType::Utf8, true),
        ],
        vec![
            strings(rows.iter().map(|(s, ..)| Some(*s)).collect()),
            strings(rows.iter().map(|(_, c, ..)| Some(*c)).collect()),
            ints(rows.iter().map(|(_, _, y, _)| Some(*y)).collect()),
            strings(rows.iter().map(|(.., v)| Some(*v)).collect()),
        ],
    )
}

/// WHO-shaped batch: `(DIM_GEO_CODE_TYPE, DIM_SEX, GEO_NAME_SHORT, DIM_TIME,
/// AMOUNT_N)`
pub fn who_batch(rows: &[(&str, &str, &str, i64, Option<f64>)]) -> RecordBatch {
    batch(
        vec![
            Field::new("DIM_GEO_CODE_TYPE", DataType::Utf8, true),
            Field::new("DIM_SEX", DataType::Utf8, true),
            Field::new("GEO_NAME_SHORT", DataType::Utf8, true),
            Field::new("DIM_TIME", DataType::Int64, true),
            Field::new("AMOUNT_N", DataType::Float64, true),
        ],
        vec![
            strings(rows.iter().map(|(g, ..)| Some(*g)).collect()),
            strings(rows.iter().map(|(_, s, ..)| Some(*s)).collect()),
            strings(rows.iter().map(|(_, _, n, ..)| Some(*n)).collect()),
            ints(rows.iter().map(|(_, _, _, y, _)| Some(*y)).collect()),
            floats(rows.iter().map(|(.., v)| *v).collect()),
        ],
    )
}

/// CDC-shaped batch, nation-only: `(year, life_exp_us_cdc)`
pub fn cdc_batch(rows: &[(i64, Option<f64>)]) -> RecordBatch {
    batch(
        vec![
            Field::new("year", DataType::Int64, true),
            Field::new("life_exp_us_cdc", DataType::Float64, true),
        ],
        vec![
            ints(rows.iter().map(|(y, _)| Some(*y)).collect()),
            floats(rows.iter().map(|(_, v)| *v).collect()),
        ],
    )
}

/// A reference-grade OWID batch covering the entities the integration
/// scenarios need, aggregates included.
pub fn reference_owid() -> RecordBatch {
    owid_batch(&[
        ("United States", Some("USA"), 2000, Some(76.6)),
        ("United States", Some("USA"), 2019, Some(78.8)),
        ("Russia", Some("RUS"), 2019, Some(73.1)),
        ("France", Some("FRA"), 1990, Some(77.0)),
        ("Denmark", Some("DNK"), 2000, Some(76.9)),
        ("World", Some("OWID_WRL"), 2000, Some(66.0)),
    ])
}
