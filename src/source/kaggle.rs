//! Kaggle health-factors adapter.
//!
//! The Kaggle compilation identifies countries by display name only, with a
//! number of variant spellings and outright typos. Names go through the
//! correction table, then the registry lookup; anything that still fails to
//! resolve is dropped and sampled into the log for auditing.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;

const REQUIRED_COLUMNS: &[&str] = &["Country", "Year", "Life expectancy"];

/// Adapter for the Kaggle health-factors table.
#[derive(Debug, Default, Clone, Copy)]
pub struct KaggleAdapter;

impl SourceAdapter for KaggleAdapter {
    fn source(&self) -> Source {
        Source::Kaggle
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let names = extract::string_column(batch, table, "Country")?;
        let years = extract::year_column(batch, table, "Year")?;
        let values = extract::float_column(batch, table, "Life expectancy")?;

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            let Some(raw_name) = names[row].as_deref() else {
                log.note_unmapped("<null name>");
                continue;
            };
            let canonical = ctx.corrections.normalize(raw_name);
            let Some(code) = ctx.registry.code_of(canonical) else {
                log.note_unmapped(raw_name.trim());
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
