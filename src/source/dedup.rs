//! `(code, year)` deduplication within a single source.
//!
//! A well-behaved source reports one value per country-year, but some
//! releases carry sub-population breakdowns that survive the stratification
//! filters, and revisions occasionally repeat a key. The policy is explicit
//! per source: averaging where multiple rows are legitimate, last-wins where
//! a repeat is a straight revision.

use rustc_hash::FxHashMap;

use super::SourceRecord;
use crate::registry::CountryCode;

/// How a source resolves duplicate `(code, year)` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// The last row for a key replaces earlier ones
    LastWins,
    /// All rows for a key are averaged
    Mean,
}

/// Collapse duplicate keys per the policy.
///
/// Output is sorted by `(code, year)` so adapter results are deterministic
/// regardless of input row order. Returns the deduplicated records and the
/// number of rows collapsed.
pub fn dedup_records(
    records: Vec<SourceRecord>,
    policy: DedupPolicy,
) -> (Vec<SourceRecord>, usize) {
    let rows_in = records.len();
    // (sum, count) per key; count also disambiguates last-wins overwrites
    let mut by_key: FxHashMap<(CountryCode, i32), (f64, usize)> = FxHashMap::default();

    for record in records {
        let entry = by_key.entry((record.code, record.year)).or_insert((0.0, 0));
        match policy {
            DedupPolicy::LastWins => *entry = (record.value, entry.1 + 1),
            DedupPolicy::Mean => *entry = (entry.0 + record.value, entry.1 + 1),
        }
    }

    let mut deduped: Vec<SourceRecord> = by_key
        .into_iter()
        .map(|((code, year), (accumulated, count))| {
            let value = match policy {
                DedupPolicy::LastWins => accumulated,
                DedupPolicy::Mean => accumulated / count as f64,
            };
            SourceRecord { code, year, value }
        })
        .collect();
    deduped.sort_unstable_by_key(|record| (record.code, record.year));

    let collapsed = rows_in - deduped.len();
    (deduped, collapsed)
}
