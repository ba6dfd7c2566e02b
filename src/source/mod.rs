//! Per-source adapters.
//!
//! Each of the six published datasets arrives as an Arrow record batch with
//! its own column names, filters and country-naming convention. An adapter
//! turns one such batch into the common `(code, year, value)` shape, dropping
//! and counting every row it cannot link. Adapters never fail on bad rows;
//! the only fatal adapter path is a structurally missing column.

pub mod cdc;
pub mod dedup;
pub mod extract;
pub mod kaggle;
pub mod owid;
pub mod unicef;
pub mod who;
pub mod worldbank;

pub use cdc::CdcAdapter;
pub use kaggle::KaggleAdapter;
pub use owid::OwidAdapter;
pub use unicef::UnicefAdapter;
pub use who::WhoAdapter;
pub use worldbank::WorldBankAdapter;

use std::fmt;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::registry::{CountryCode, EntityRegistry, NameCorrections};

/// The six input sources, in merge priority order.
///
/// The order is load-bearing for provenance: the reference source (OWID)
/// folds into the merge first, and the final table's metric columns appear
/// in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    /// Our World in Data historical life expectancy (the reference source)
    Owid,
    /// World Bank life expectancy at birth
    WorldBank,
    /// Kaggle health-factors compilation
    Kaggle,
    /// UNICEF life expectancy indicator
    Unicef,
    /// WHO healthy life expectancy (HALE), a different quantity from the rest
    Who,
    /// CDC United States life tables (nation-only)
    Cdc,
}

impl Source {
    /// All sources in priority order
    pub const ALL: [Self; 6] = [
        Self::Owid,
        Self::WorldBank,
        Self::Kaggle,
        Self::Unicef,
        Self::Who,
        Self::Cdc,
    ];

    /// Number of sources
    pub const COUNT: usize = Self::ALL.len();

    /// Slot index for per-source value storage
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Owid => 0,
            Self::WorldBank => 1,
            Self::Kaggle => 2,
            Self::Unicef => 3,
            Self::Who => 4,
            Self::Cdc => 5,
        }
    }

    /// The namespaced metric column this source contributes to the final
    /// table. Unique per source, so non-key columns can never collide in
    /// the merge.
    #[must_use]
    pub const fn metric_column(self) -> &'static str {
        match self {
            Self::Owid => "life_exp_owid",
            Self::WorldBank => "life_exp_wb",
            Self::Kaggle => "life_exp_kaggle",
            Self::Unicef => "life_exp_unicef",
            Self::Who => "hale_who",
            Self::Cdc => "life_exp_us_cdc",
        }
    }

    /// Human-readable source label for logs and reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Owid => "OWID",
            Self::WorldBank => "World Bank",
            Self::Kaggle => "Kaggle",
            Self::Unicef => "UNICEF",
            Self::Who => "WHO",
            Self::Cdc => "CDC",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One observation of one metric from one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRecord {
    /// Canonical country code
    pub code: CountryCode,
    /// Observation year
    pub year: i32,
    /// The reported metric value
    pub value: f64,
}

/// Per-adapter drop diagnostics.
///
/// A diagnostic output, not control flow: together with the reconciler's
/// prune count these logs explain every discrepancy between raw input and
/// final output.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterLog {
    /// Which source this log describes
    pub source: Source,
    /// Rows in the raw input batch
    pub rows_in: usize,
    /// Records emitted after all filters and dedup
    pub rows_out: usize,
    /// Rows removed by source-specific stratification filters (sex, geo)
    pub filtered_strata: usize,
    /// The stratification token that matched, where a cascade applies
    pub filter_token: Option<String>,
    /// Rows dropped because the name or native code resolved to no entity
    pub dropped_unmapped: usize,
    /// Sample of unmapped names/codes, capped for readability
    pub unmapped_samples: Vec<String>,
    /// Rows dropped for a null or non-numeric value
    pub dropped_non_numeric: usize,
    /// Rows dropped for a null year or a year outside the accepted range
    pub dropped_out_of_range: usize,
    /// Duplicate `(code, year)` rows collapsed by the dedup policy
    pub duplicates_collapsed: usize,
}

const UNMAPPED_SAMPLE_CAP: usize = 8;

impl AdapterLog {
    /// A fresh log for `source`
    #[must_use]
    pub fn new(source: Source) -> Self {
        Self {
            source,
            rows_in: 0,
            rows_out: 0,
            filtered_strata: 0,
            filter_token: None,
            dropped_unmapped: 0,
            unmapped_samples: Vec::new(),
            dropped_non_numeric: 0,
            dropped_out_of_range: 0,
            duplicates_collapsed: 0,
        }
    }

    /// Record an unmappable name/code, keeping a bounded sample for audit
    pub fn note_unmapped(&mut self, raw: &str) {
        self.dropped_unmapped += 1;
        if self.unmapped_samples.len() < UNMAPPED_SAMPLE_CAP
            && !self.unmapped_samples.iter().any(|s| s == raw)
        {
            self.unmapped_samples.push(raw.to_string());
        }
    }

    /// Emit the standard completion line for this adapter
    pub fn log_summary(&self) {
        log::info!(
            "{}: {} rows in, {} records out ({} unmapped, {} non-numeric, {} out-of-range, {} duplicates collapsed)",
            self.source,
            self.rows_in,
            self.rows_out,
            self.dropped_unmapped,
            self.dropped_non_numeric,
            self.dropped_out_of_range,
            self.duplicates_collapsed,
        );
        if !self.unmapped_samples.is_empty() {
            log::warn!(
                "{}: unmapped samples: {:?}",
                self.source,
                self.unmapped_samples
            );
        }
    }
}

/// A source coerced into the common shape: deduplicated, year-bounded
/// records plus the drop log that accounts for everything discarded.
#[derive(Debug, Clone)]
pub struct AdaptedSource {
    /// Which source produced these records
    pub source: Source,
    /// `(code, year)`-unique observations
    pub records: Vec<SourceRecord>,
    /// Drop diagnostics
    pub log: AdapterLog,
}

/// Read-only linkage state shared by every adapter.
pub struct LinkContext<'a> {
    /// Canonical entity registry
    pub registry: &'a EntityRegistry,
    /// Name-variant correction table
    pub corrections: &'a NameCorrections,
    /// Run configuration
    pub config: &'a PipelineConfig,
}

/// One per input source: converts a source-native batch into the common
/// record shape.
pub trait SourceAdapter: Sync {
    /// Which source this adapter handles
    fn source(&self) -> Source;

    /// Columns that must be present before any row work starts
    fn required_columns(&self) -> &'static [&'static str];

    /// Convert the raw batch. Bad rows are dropped and counted; only a
    /// missing required column (or an unreadable column type) is fatal.
    fn adapt(&self, batch: &RecordBatch, ctx: &LinkContext<'_>) -> Result<AdaptedSource>;
}

/// Run a set of adapters over their batches in parallel.
///
/// Adapters share only the read-only [`LinkContext`], so the fan-out is
/// safe; the first structural error aborts the whole run.
pub fn adapt_all(
    inputs: &[(&dyn SourceAdapter, &RecordBatch)],
    ctx: &LinkContext<'_>,
) -> Result<Vec<AdaptedSource>> {
    let mut adapted = inputs
        .par_iter()
        .map(|(adapter, batch)| adapter.adapt(batch, ctx))
        .collect::<Result<Vec<_>>>()?;
    adapted.sort_by_key(|source| source.source.index());
    Ok(adapted)
}

/// Shared tail of every adapter's per-row loop: check the year window and
/// value presence, then emit. The caller has already resolved the code.
pub(crate) fn push_record(
    records: &mut Vec<SourceRecord>,
    log: &mut AdapterLog,
    config: &PipelineConfig,
    code: CountryCode,
    year: Option<i32>,
    value: Option<f64>,
) {
    let Some(value) = value else {
        log.dropped_non_numeric += 1;
        return;
    };
    let Some(year) = year else {
        log.dropped_out_of_range += 1;
        return;
    };
    if !config.year_in_range(year) {
        log.dropped_out_of_range += 1;
        return;
    }
    records.push(SourceRecord { code, year, value });
}
