//! Conflict and bounds auditing.
//!
//! A read-only pass over the reconciled table. Findings are advisory: they
//! flow into the report for the downstream reporting collaborators and never
//! back into the data. Out-of-bounds values in particular are retained in
//! the table as documented extremes, not removed.

use itertools::Itertools;
use serde::Serialize;

use crate::config::AuditConfig;
use crate::merge::FinalTable;
use crate::registry::CountryCode;
use crate::source::Source;

/// The total life expectancy family: sources measuring the same underlying
/// quantity, comparable by absolute difference. WHO HALE measures a
/// health-adjusted quantity and CDC covers a single nation with its own
/// methodology; both sit outside the family.
pub const LE_FAMILY: [Source; 4] = [
    Source::Owid,
    Source::WorldBank,
    Source::Kaggle,
    Source::Unicef,
];

/// A metric value outside the plausibility interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsViolation {
    /// Country code
    pub code: CountryCode,
    /// Observation year
    pub year: i32,
    /// The source reporting the value
    pub source: Source,
    /// The implausible value
    pub value: f64,
}

/// Two same-family sources disagreeing beyond the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleranceConflict {
    /// Country code
    pub code: CountryCode,
    /// Observation year
    pub year: i32,
    /// First source of the diverging pair
    pub source_a: Source,
    /// Second source of the diverging pair
    pub source_b: Source,
    /// Absolute difference in years
    pub delta: f64,
}

/// A health-adjusted value exceeding the raw total it can never exceed.
///
/// Known limitation: the check assumes both contributing sources describe
/// the same population-year; revision mismatches between them can produce
/// false violations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalViolation {
    /// Country code
    pub code: CountryCode,
    /// Observation year
    pub year: i32,
    /// The health-adjusted value (WHO HALE)
    pub hale: f64,
    /// The raw total it exceeded (World Bank)
    pub total: f64,
}

/// The auditor's structured report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    /// Values outside the plausibility bounds, per source
    pub bounds_violations: Vec<BoundsViolation>,
    /// Rows where at least two same-family sources reported a value
    pub comparable_rows: usize,
    /// Comparable rows with every pairwise difference inside tolerance
    pub within_tolerance: usize,
    /// Diverging same-family pairs
    pub tolerance_conflicts: Vec<ToleranceConflict>,
    /// HALE-exceeds-total violations
    pub directional_violations: Vec<DirectionalViolation>,
}

impl AuditReport {
    /// Serialize the report for the reporting collaborators
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Audit the final table. Pure and idempotent: the table is never mutated,
/// and two runs over the same table yield equal reports.
#[must_use]
pub fn audit(table: &FinalTable, config: &AuditConfig) -> AuditReport {
    let mut report = AuditReport::default();

    for row in table.rows() {
        // Plausibility bounds, every source independently
        for source in Source::ALL {
            if let Some(value) = row.value(source) {
                if value < config.lower_bound || value > config.upper_bound {
                    report.bounds_violations.push(BoundsViolation {
                        code: row.code,
                        year: row.year,
                        source,
                        value,
                    });
                }
            }
        }

        // Same-family divergence, pairwise
        let present: Vec<(Source, f64)> = LE_FAMILY
            .iter()
            .filter_map(|&source| row.value(source).map(|value| (source, value)))
            .collect();
        if present.len() >= 2 {
            report.comparable_rows += 1;
            let mut conflicted = false;
            for ((source_a, value_a), (source_b, value_b)) in
                present.iter().copied().tuple_combinations()
            {
                let delta = (value_a - value_b).abs();
                if delta > config.tolerance_years {
                    conflicted = true;
                    report.tolerance_conflicts.push(ToleranceConflict {
                        code: row.code,
                        year: row.year,
                        source_a,
                        source_b,
                        delta,
                    });
                }
            }
            if !conflicted {
                report.within_tolerance += 1;
            }
        }

        // Directional inequality: health-adjusted must not exceed raw total
        if let (Some(hale), Some(total)) =
            (row.value(Source::Who), row.value(Source::WorldBank))
        {
            if hale > total {
                report.directional_violations.push(DirectionalViolation {
                    code: row.code,
                    year: row.year,
                    hale,
                    total,
                });
            }
        }
    }

    log::info!(
        "audit: {} bounds violations, {}/{} comparable rows within tolerance, {} directional violations",
        report.bounds_violations.len(),
        report.within_tolerance,
        report.comparable_rows,
        report.directional_violations.len(),
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_sources, reconcile};
    use crate::registry::{EntityRegistry, RegistryOptions};
    use crate::source::{AdaptedSource, AdapterLog, SourceRecord};
    use crate::config::PipelineConfig;

    use std::sync::Arc;

    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    fn table(per_source: &[(Source, &[(&str, i32, f64)])]) -> FinalTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Entity", DataType::Utf8, true),
            Field::new("Code", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(vec![
                Some("United States"),
                Some("Denmark"),
            ])) as ArrayRef,
            Arc::new(StringArray::from(vec![Some("USA"), Some("DNK")])) as ArrayRef,
        ])
        .unwrap();
        let registry = EntityRegistry::from_reference(
            &batch,
            &RegistryOptions::default(),
            &PipelineConfig::default(),
        )
        .unwrap();

        let sources = per_source
            .iter()
            .map(|(source, records)| AdaptedSource {
                source: *source,
                records: records
                    .iter()
                    .map(|(code, year, value)| SourceRecord {
                        code: crate::registry::CountryCode::new(code).unwrap(),
                        year: *year,
                        value: *value,
                    })
                    .collect(),
                log: AdapterLog::new(*source),
            })
            .collect();
        reconcile(merge_sources(sources), &registry).0
    }

    #[test]
    fn value_below_lower_bound_is_flagged_not_removed() {
        let table = table(&[(Source::WorldBank, &[("USA", 1918, 11.0)])]);
        let report = audit(&table, &AuditConfig::default());
        assert_eq!(report.bounds_violations.len(), 1);
        assert_eq!(report.bounds_violations[0].source, Source::WorldBank);
        assert!((report.bounds_violations[0].value - 11.0).abs() < f64::EPSILON);
        // the table keeps the extreme
        assert_eq!(table.rows()[0].value(Source::WorldBank), Some(11.0));
    }

    #[test]
    fn bounds_are_inclusive() {
        let table = table(&[(Source::WorldBank, &[("USA", 2000, 13.0), ("DNK", 2000, 95.0)])]);
        let report = audit(&table, &AuditConfig::default());
        assert!(report.bounds_violations.is_empty());
    }

    #[test]
    fn divergent_family_pair_is_a_tolerance_conflict() {
        let table = table(&[
            (Source::Owid, &[("USA", 2000, 76.0)]),
            (Source::WorldBank, &[("USA", 2000, 80.0)]),
        ]);
        let report = audit(&table, &AuditConfig::default());
        assert_eq!(report.comparable_rows, 1);
        assert_eq!(report.within_tolerance, 0);
        assert_eq!(report.tolerance_conflicts.len(), 1);
        let conflict = &report.tolerance_conflicts[0];
        assert!((conflict.delta - 4.0).abs() < 1e-9);
    }

    #[test]
    fn close_family_pair_is_within_tolerance() {
        let table = table(&[
            (Source::Owid, &[("USA", 2000, 76.0)]),
            (Source::WorldBank, &[("USA", 2000, 75.5)]),
        ]);
        let report = audit(&table, &AuditConfig::default());
        assert_eq!(report.within_tolerance, 1);
        assert!(report.tolerance_conflicts.is_empty());
    }

    #[test]
    fn hale_exceeding_total_is_a_directional_violation() {
        let table = table(&[
            (Source::Who, &[("USA", 2019, 80.0)]),
            (Source::WorldBank, &[("USA", 2019, 75.0)]),
        ]);
        let report = audit(&table, &AuditConfig::default());
        assert_eq!(report.directional_violations.len(), 1);
        // HALE is outside the family, so this is not also a tolerance conflict
        assert!(report.tolerance_conflicts.is_empty());
        assert_eq!(report.comparable_rows, 0);
    }

    #[test]
    fn audit_is_idempotent_and_non_mutating() {
        let table = table(&[
            (Source::Owid, &[("USA", 2000, 76.0)]),
            (Source::WorldBank, &[("USA", 2000, 96.0)]),
        ]);
        let before = table.clone();
        let first = audit(&table, &AuditConfig::default());
        let second = audit(&table, &AuditConfig::default());
        assert_eq!(first, second);
        assert_eq!(table, before);
    }

    #[test]
    fn report_serializes_for_reporting_collaborators() {
        let table = table(&[(Source::WorldBank, &[("USA", 1918, 11.0)])]);
        let report = audit(&table, &AuditConfig::default());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"bounds_violations\""));
        assert!(json.contains("\"USA\""));
    }
}
