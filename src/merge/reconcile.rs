//! Post-merge reconciliation.
//!
//! Backfills the canonical display name onto every row, prunes rows whose
//! code has no canonical-entity backing (regional aggregates with
//! syntactically valid codes), and freezes a deterministic row and column
//! order so identical inputs always yield byte-identical output.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int32Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::{MergedRow, MergedTable};
use crate::error::Result;
use crate::registry::EntityRegistry;
use crate::source::Source;

/// Row-count evidence from the reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Keys in the merged table before pruning
    pub rows_in: usize,
    /// Rows removed because their code backs no canonical entity
    pub rows_pruned: usize,
    /// Rows in the final table
    pub rows_out: usize,
}

/// The frozen output table: sorted by `(code, year)`, every display name
/// backfilled from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalTable {
    rows: Vec<MergedRow>,
}

impl FinalTable {
    /// The nine output columns, in fixed order: key columns, name, then one
    /// metric column per source in priority order.
    pub const COLUMN_NAMES: [&'static str; 9] = [
        "iso3",
        "country_name",
        "year",
        Source::Owid.metric_column(),
        Source::WorldBank.metric_column(),
        Source::Kaggle.metric_column(),
        Source::Unicef.metric_column(),
        Source::Who.metric_column(),
        Source::Cdc.metric_column(),
    ];

    /// The rows, sorted by `(code, year)`
    #[must_use]
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project the table onto the fixed nine-column Arrow shape for the
    /// export collaborator.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut iso3 = StringBuilder::new();
        let mut country_name = StringBuilder::new();
        let mut year = Int32Builder::new();
        let mut metrics: Vec<Float64Builder> =
            (0..Source::COUNT).map(|_| Float64Builder::new()).collect();

        for row in &self.rows {
            iso3.append_value(row.code.as_str());
            country_name.append_value(row.display_name.as_deref().unwrap_or_default());
            year.append_value(row.year);
            for source in Source::ALL {
                metrics[source.index()].append_option(row.value(source));
            }
        }

        let mut fields = vec![
            Field::new("iso3", DataType::Utf8, false),
            Field::new("country_name", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(iso3.finish()),
            Arc::new(country_name.finish()),
            Arc::new(year.finish()),
        ];
        for source in Source::ALL {
            fields.push(Field::new(source.metric_column(), DataType::Float64, true));
            columns.push(Arc::new(metrics[source.index()].finish()));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}

/// Reconcile the merged table against the registry.
///
/// Never fails on well-formed input: pruned rows are counted and logged,
/// processing continues.
pub fn reconcile(table: MergedTable, registry: &EntityRegistry) -> (FinalTable, ReconcileStats) {
    let rows_in = table.len();
    let mut rows: Vec<MergedRow> = Vec::with_capacity(rows_in);

    for mut row in table.into_rows() {
        match registry.name_of(row.code) {
            Some(name) => {
                // Unconditional overwrite: the registry is the single name
                // authority, not a fill-if-null fallback
                row.display_name = Some(name.to_string());
                rows.push(row);
            }
            None => {
                log::debug!("pruning non-entity key ({}, {})", row.code, row.year);
            }
        }
    }

    rows.sort_unstable_by_key(|row| (row.code, row.year));

    let stats = ReconcileStats {
        rows_in,
        rows_pruned: rows_in - rows.len(),
        rows_out: rows.len(),
    };
    if stats.rows_pruned > 0 {
        log::info!(
            "reconcile: pruned {} non-entity rows, {} remain",
            stats.rows_pruned,
            stats.rows_out
        );
    }
    (FinalTable { rows }, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::StringArray;
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::config::PipelineConfig;
    use crate::merge::merge_sources;
    use crate::registry::{CountryCode, RegistryOptions};
    use crate::source::{AdaptedSource, AdapterLog, SourceRecord};

    fn registry(entries: &[(&str, &str)]) -> EntityRegistry {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Entity", DataType::Utf8, true),
            Field::new("Code", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(
                entries.iter().map(|(n, _)| Some(*n)).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(StringArray::from(
                entries.iter().map(|(_, c)| Some(*c)).collect::<Vec<_>>(),
            )) as ArrayRef,
        ])
        .unwrap();
        EntityRegistry::from_reference(
            &batch,
            &RegistryOptions::default(),
            &PipelineConfig::default(),
        )
        .unwrap()
    }

    fn merged(records: &[(&str, i32, f64)]) -> MergedTable {
        merge_sources(vec![AdaptedSource {
            source: Source::WorldBank,
            records: records
                .iter()
                .map(|(code, year, value)| SourceRecord {
                    code: CountryCode::new(code).unwrap(),
                    year: *year,
                    value: *value,
                })
                .collect(),
            log: AdapterLog::new(Source::WorldBank),
        }])
    }

    #[test]
    fn aggregate_codes_without_entity_backing_are_pruned() {
        let registry = registry(&[("United States", "USA")]);
        let table = merged(&[("USA", 2000, 76.0), ("ARB", 2000, 68.0)]);
        let (final_table, stats) = reconcile(table, &registry);
        assert_eq!(stats.rows_pruned, 1);
        assert_eq!(final_table.len(), 1);
        assert_eq!(final_table.rows()[0].code.as_str(), "USA");
    }

    #[test]
    fn display_name_is_always_the_registry_spelling() {
        let registry = registry(&[("United States", "USA")]);
        let (final_table, _) = reconcile(merged(&[("USA", 2000, 76.0)]), &registry);
        assert_eq!(
            final_table.rows()[0].display_name.as_deref(),
            Some("United States")
        );
    }

    #[test]
    fn sort_is_deterministic_and_idempotent() {
        let registry = registry(&[("Denmark", "DNK"), ("Sweden", "SWE")]);
        let table = merged(&[
            ("SWE", 2001, 80.0),
            ("DNK", 2001, 77.0),
            ("SWE", 2000, 79.9),
            ("DNK", 2000, 76.6),
        ]);
        let (first, _) = reconcile(table, &registry);
        let keys: Vec<_> = first
            .rows()
            .iter()
            .map(|row| (row.code.as_str().to_string(), row.year))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("DNK".to_string(), 2000),
                ("DNK".to_string(), 2001),
                ("SWE".to_string(), 2000),
                ("SWE".to_string(), 2001),
            ]
        );

        // Re-running the sort on an already-sorted table changes nothing
        let mut resorted = first.clone();
        resorted.rows.sort_unstable_by_key(|row| (row.code, row.year));
        assert_eq!(resorted, first);
    }

    #[test]
    fn record_batch_projection_has_the_fixed_nine_columns() {
        let registry = registry(&[("United States", "USA")]);
        let (final_table, _) = reconcile(merged(&[("USA", 2000, 76.0)]), &registry);
        let batch = final_table.to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 9);
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        assert_eq!(names, FinalTable::COLUMN_NAMES);
        // Absent observations stay null in the projection
        let who_column = batch.column_by_name(Source::Who.metric_column()).unwrap();
        assert_eq!(who_column.null_count(), 1);
    }
}
