//! World Bank life expectancy adapter.
//!
//! The extraction stage already reshapes the World Bank API response into
//! `(iso3, year, life_exp_wb)`, so this adapter only has to drop null codes
//! and apply the common coercion, range and dedup steps.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;
use crate::registry::CountryCode;

const REQUIRED_COLUMNS: &[&str] = &["iso3", "year", "life_exp_wb"];

/// Adapter for the pre-flattened World Bank table.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorldBankAdapter;

impl SourceAdapter for WorldBankAdapter {
    fn source(&self) -> Source {
        Source::WorldBank
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let codes = extract::string_column(batch, table, "iso3")?;
        let years = extract::year_column(batch, table, "year")?;
        let values = extract::float_column(batch, table, "life_exp_wb")?;

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            let Some(raw_code) = codes[row].as_deref().map(str::trim) else {
                log.note_unmapped("<null code>");
                continue;
            };
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
