//! CDC United States life tables adapter.
//!
//! A nation-only source: every observation belongs to one fixed entity, so
//! the adapter assigns that entity's code unconditionally instead of doing
//! any name or code resolution.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;
use crate::registry::CountryCode;

const REQUIRED_COLUMNS: &[&str] = &["year", "life_exp_us_cdc"];

/// Adapter for the CDC US demographics table.
#[derive(Debug, Clone, Copy)]
pub struct CdcAdapter {
    code: CountryCode,
}

impl CdcAdapter {
    /// Adapter bound to an explicit fixed entity
    #[must_use]
    pub const fn nation(code: CountryCode) -> Self {
        Self { code }
    }
}

impl Default for CdcAdapter {
    fn default() -> Self {
        Self::nation(CountryCode::from_ascii(*b"USA"))
    }
}

impl SourceAdapter for CdcAdapter {
    fn source(&self) -> Source {
        Source::Cdc
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let years = extract::year_column(batch, table, "year")?;
        let values = extract::float_column(batch, table, "life_exp_us_cdc")?;

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            push_record(&mut records, &mut log, ctx.config, self.code, years[row], values[row]);
        }

        let (records, collapsed) = dedup_records(records, DedupPolicy::LastWins);
        log.duplicates_collapsed = collapsed;
        log.rows_out = records.len();
        log.log_summary();

        Ok(AdaptedSource { source: self.source(), records, log })
    }
}
