//! UNICEF life expectancy adapter.
//!
//! SDMX-shaped export: native codes in `REF_AREA`, observations in
//! `OBS_VALUE` as strings, and an optional `SEX` dimension. When the `SEX`
//! column is present only the combined `_T` stratum is kept; sub-population
//! rows that survive (older releases lack the column) are averaged per key
//! rather than allowed to collide.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;
use crate::registry::CountryCode;

const REQUIRED_COLUMNS: &[&str] = &["REF_AREA", "TIME_PERIOD", "OBS_VALUE"];
const SEX_COLUMN: &str = "SEX";
const SEX_TOTAL: &str = "_T";

/// Adapter for the UNICEF SDMX export.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicefAdapter;

impl SourceAdapter for UnicefAdapter {
    fn source(&self) -> Source {
        Source::Unicef
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let codes = extract::string_column(batch, table, "REF_AREA")?;
        let years = extract::year_column(batch, table, "TIME_PERIOD")?;
        let values = extract::float_column(batch, table, "OBS_VALUE")?;
        let sexes = extract::optional_string_column(batch, table, SEX_COLUMN)?;

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        if sexes.is_some() {
            log.filter_token = Some(SEX_TOTAL.to_string());
        }
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            if let Some(sexes) = &sexes {
                if sexes[row].as_deref() != Some(SEX_TOTAL) {
                    log.filtered_strata += 1;
                    continue;
                }
            }
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

        let (records, collapsed) = dedup_records(records, DedupPolicy::Mean);
        log.duplicates_collapsed = collapsed;
        log.rows_out = records.len();
        log.log_summary();

        Ok(AdaptedSource { source: self.source(), records, log })
    }
}
