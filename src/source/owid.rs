//! OWID historical life expectancy adapter.
//!
//! OWID is the cleanest and widest of the six sources; it doubles as the
//! reference table the entity registry is built from. It carries a native
//! code column, with synthetic aggregates marked by the `OWID_` prefix.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;
use crate::registry::CountryCode;

const REQUIRED_COLUMNS: &[&str] = &["Entity", "Code", "Year", "Life expectancy"];

/// Adapter for the OWID historical life expectancy table.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwidAdapter;

impl SourceAdapter for OwidAdapter {
    fn source(&self) -> Source {
        Source::Owid
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let codes = extract::string_column(batch, table, "Code")?;
        let years = extract::year_column(batch, table, "Year")?;
        let values = extract::float_column(batch, table, "Life expectancy")?;

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            let Some(raw_code) = codes[row].as_deref().map(str::trim) else {
                log.note_unmapped("<null code>");
                continue;
            };
            if raw_code.is_empty() || ctx.config.is_aggregate_code(raw_code) {
                log.note_unmapped(raw_code);
                continue;
            }
            let Ok(code) = CountryCode::new(raw_code) else {
                log.note_unmapped(raw_code);
                continue;
            };
            push_record(&mut records, &mut log, ctx.config, code, years[row], values[row]);
        }

        let (records, collapsed) = dedup_records(records, DedupPolicy::LastWins);
        log.duplicates_collapsed = collapsed;
        log.rows_out = records.len();
        log.log_summary();

        Ok(AdaptedSource { source: self.source(), records, log })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::config::PipelineConfig;
    use crate::registry::{EntityRegistry, NameCorrections, RegistryOptions};

    fn owid_batch(rows: &[(&str, Option<&str>, i64, Option<f64>)]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Entity", DataType::Utf8, true),
            Field::new("Code", DataType::Utf8, true),
            Field::new("Year", DataType::Int64, true),
            Field::new("Life expectancy", DataType::Float64, true),
        ]));
        RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(
                rows.iter().map(|(n, ..)| Some(*n)).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(StringArray::from(
                rows.iter().map(|(_, c, ..)| *c).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(Int64Array::from(
                rows.iter().map(|(_, _, y, _)| Some(*y)).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(Float64Array::from(
                rows.iter().map(|(.., v)| *v).collect::<Vec<_>>(),
            )) as ArrayRef,
        ])
        .unwrap()
    }

    #[test]
    fn aggregates_nulls_and_bad_years_are_dropped() {
        let batch = owid_batch(&[
            ("Denmark", Some("DNK"), 2000, Some(76.6)),
            ("World", Some("OWID_WRL"), 2000, Some(66.0)),
            ("Limbo", None, 2000, Some(50.0)),
            ("Denmark", Some("DNK"), 1800, Some(40.0)),
            ("Denmark", Some("DNK"), 2001, None),
        ]);
        let config = PipelineConfig::default();
        let registry = EntityRegistry::from_reference(
            &batch,
            &RegistryOptions::default(),
            &config,
        )
        .unwrap();
        let corrections = NameCorrections::default();
        let ctx = LinkContext { registry: &registry, corrections: &corrections, config: &config };

        let adapted = OwidAdapter.adapt(&batch, &ctx).unwrap();
        assert_eq!(adapted.records.len(), 1);
        assert_eq!(adapted.records[0].code.as_str(), "DNK");
        assert_eq!(adapted.log.dropped_unmapped, 2);
        assert_eq!(adapted.log.dropped_out_of_range, 1);
        assert_eq!(adapted.log.dropped_non_numeric, 1);
    }
}
