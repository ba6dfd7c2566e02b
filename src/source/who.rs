//! WHO healthy life expectancy (HALE) adapter.
//!
//! The messiest of the six sources. Countries arrive as display names in
//! `GEO_NAME_SHORT` mixed in with regional aggregates, which an optional
//! `DIM_GEO_CODE_TYPE` column distinguishes. The combined-sex stratum has
//! been tagged with different literal tokens across releases, so the filter
//! cascades through the known tokens in priority order; when none is present
//! the strata are averaged instead, as the upstream publisher intends.

use arrow::record_batch::RecordBatch;

use super::dedup::{DedupPolicy, dedup_records};
use super::{AdaptedSource, AdapterLog, LinkContext, Source, SourceAdapter, extract, push_record};
use crate::error::Result;

const REQUIRED_COLUMNS: &[&str] = &["GEO_NAME_SHORT", "DIM_TIME", "AMOUNT_N"];
const GEO_TYPE_COLUMN: &str = "DIM_GEO_CODE_TYPE";
const GEO_TYPE_COUNTRY: &str = "COUNTRY";
const SEX_COLUMN: &str = "DIM_SEX";
/// Combined-sex tokens observed across WHO releases, tried in order.
const SEX_TOKEN_CASCADE: &[&str] = &["TOTAL", "BTSX", "BOTHSEXES"];

/// Adapter for the WHO HALE indicator export.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhoAdapter;

impl WhoAdapter {
    /// Pick the first cascade token that actually occurs in the column.
    fn select_sex_token(sexes: &[Option<String>]) -> Option<&'static str> {
        SEX_TOKEN_CASCADE
            .iter()
            .copied()
            .find(|token| sexes.iter().any(|cell| cell.as_deref() == Some(*token)))
    }
}

impl SourceAdapter for WhoAdapter {
    fn source(&self) -> Source {
        Source::Who
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource> {
        let table = self.source().label();
        extract::validate_columns(batch, table, REQUIRED_COLUMNS)?;

        let names = extract::string_column(batch, table, "GEO_NAME_SHORT")?;
        let years = extract::year_column(batch, table, "DIM_TIME")?;
        let values = extract::float_column(batch, table, "AMOUNT_N")?;
        let geo_types = extract::optional_string_column(batch, table, GEO_TYPE_COLUMN)?;
        let sexes = extract::optional_string_column(batch, table, SEX_COLUMN)?;

        let sex_token = sexes.as_deref().and_then(Self::select_sex_token);
        if sexes.is_some() && sex_token.is_none() {
            log::warn!("{table}: no combined-sex token found, averaging across sex strata");
        }

        let mut log = AdapterLog::new(self.source());
        log.rows_in = batch.num_rows();
        log.filter_token = sex_token.map(str::to_string);
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            if let Some(geo_types) = &geo_types {
                if geo_types[row].as_deref() != Some(GEO_TYPE_COUNTRY) {
                    log.filtered_strata += 1;
                    continue;
                }
            }
            if let (Some(sexes), Some(token)) = (&sexes, sex_token) {
                if sexes[row].as_deref() != Some(token) {
                    log.filtered_strata += 1;
                    continue;
                }
            }
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

        // Mean dedup also absorbs the sex strata when no cascade token matched
        let (records, collapsed) = dedup_records(records, DedupPolicy::Mean);
        log.duplicates_collapsed = collapsed;
        log.rows_out = records.len();
        log.log_summary();

        Ok(AdaptedSource { source: self.source(), records, log })
    }
}
