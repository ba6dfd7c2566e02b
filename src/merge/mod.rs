//! Merge engine: outer-join accumulation over the composite key.
//!
//! The six adapted sources fold sequentially into one wide table keyed by
//! `(code, year)`. Each source writes only its own value slot, so non-key
//! columns cannot collide or overwrite each other; display names never
//! transit the merge at all; the reconciler backfills them from the
//! registry afterwards.

pub mod reconcile;

pub use reconcile::{FinalTable, ReconcileStats, reconcile};

use rustc_hash::FxHashMap;

use crate::registry::CountryCode;
use crate::source::{AdaptedSource, Source};

/// One wide row: the composite key, the canonical display name (filled by
/// the reconciler), and one optional value slot per source. `None` means
/// that source reported no observation for this key: absence, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    /// Canonical country code
    pub code: CountryCode,
    /// Observation year
    pub year: i32,
    /// Canonical display name; `None` until the reconciler backfills it
    pub display_name: Option<String>,
    values: [Option<f64>; Source::COUNT],
}

impl MergedRow {
    /// An empty row for a key, all value slots absent
    #[must_use]
    pub fn new(code: CountryCode, year: i32) -> Self {
        Self {
            code,
            year,
            display_name: None,
            values: [None; Source::COUNT],
        }
    }

    /// The value this source reported for the row's key, if any
    #[must_use]
    pub fn value(&self, source: Source) -> Option<f64> {
        self.values[source.index()]
    }

    pub(crate) fn set_value(&mut self, source: Source, value: f64) {
        self.values[source.index()] = Some(value);
    }

    /// How many sources reported a value for this row
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

/// The wide table under construction: union of every source's keys.
#[derive(Debug, Default)]
pub struct MergedTable {
    rows: FxHashMap<(CountryCode, i32), MergedRow>,
}

impl MergedTable {
    /// Number of distinct `(code, year)` keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no source contributed any key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row for a key, if any source observed it
    #[must_use]
    pub fn get(&self, code: CountryCode, year: i32) -> Option<&MergedRow> {
        self.rows.get(&(code, year))
    }

    pub(crate) fn into_rows(self) -> impl Iterator<Item = MergedRow> {
        self.rows.into_values()
    }
}

/// Fold the adapted sources into one wide table.
///
/// Sources are folded in priority order regardless of argument order; the
/// result's key set is the union of all sources' key sets, and every slot
/// is populated exactly where its source had data. O(total records) with
/// hashed keys.
#[must_use]
pub fn merge_sources(mut sources: Vec<AdaptedSource>) -> MergedTable {
    sources.sort_by_key(|source| source.source.index());

    let mut table = MergedTable::default();
    for adapted in sources {
        let records = adapted.records.len();
        for record in adapted.records {
            table
                .rows
                .entry((record.code, record.year))
                .or_insert_with(|| MergedRow::new(record.code, record.year))
                .set_value(adapted.source, record.value);
        }
        log::info!(
            "merged {}: {} records, accumulator now {} keys",
            adapted.source,
            records,
            table.len()
        );
    }
    table
}
