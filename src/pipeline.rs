//! Pipeline orchestration.
//!
//! Wires the stages together for one batch run: build the registry and
//! correction table, fan the six adapters out in parallel, fold the results
//! into the wide table, reconcile, and audit. The caller supplies in-memory
//! tables and receives the frozen final table plus every piece of
//! side-channel evidence the run produced.

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::audit::{AuditReport, audit};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::merge::{FinalTable, ReconcileStats, merge_sources, reconcile};
use crate::registry::{EntityRegistry, NameCorrections, RegistryOptions};
use crate::source::{
    AdapterLog, CdcAdapter, KaggleAdapter, LinkContext, OwidAdapter, Source, SourceAdapter,
    UnicefAdapter, WhoAdapter, WorldBankAdapter, adapt_all,
};

/// The six raw per-source tables, in source-native shape.
///
/// The CDC table is optional: the nation-only spreadsheet is not always
/// present in an acquisition run, and the merge is well-defined without it.
#[derive(Debug, Clone)]
pub struct SourceTables {
    /// OWID historical life expectancy (also the reference table)
    pub owid: RecordBatch,
    /// World Bank life expectancy, pre-flattened
    pub worldbank: RecordBatch,
    /// Kaggle health factors
    pub kaggle: RecordBatch,
    /// UNICEF SDMX export
    pub unicef: RecordBatch,
    /// WHO HALE export
    pub who: RecordBatch,
    /// CDC US life tables, when available
    pub cdc: Option<RecordBatch>,
}

/// Non-null observation count per metric column of the final table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceCoverage {
    /// The source
    pub source: Source,
    /// Rows of the final table where this source reported a value
    pub rows_with_value: usize,
}

/// Everything a completed run yields: the table plus the three kinds of
/// side-channel evidence that together explain every discrepancy between
/// raw input and final output.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The frozen, reconciled wide table
    pub table: FinalTable,
    /// Per-adapter drop diagnostics, in source priority order
    pub adapter_logs: Vec<AdapterLog>,
    /// Row counts from the reconciliation pass
    pub reconcile: ReconcileStats,
    /// Advisory audit findings
    pub report: AuditReport,
    /// Per-source coverage of the final table
    pub coverage: Vec<SourceCoverage>,
}

/// The batch merge pipeline. Construct once, run to completion.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    registry_options: RegistryOptions,
    corrections: NameCorrections,
}

impl Pipeline {
    /// A pipeline with the given run configuration
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the registry build options (reference column names,
    /// display-name overrides)
    #[must_use]
    pub fn with_registry_options(mut self, options: RegistryOptions) -> Self {
        self.registry_options = options;
        self
    }

    /// Replace the name-correction table
    #[must_use]
    pub fn with_corrections(mut self, corrections: NameCorrections) -> Self {
        self.corrections = corrections;
        self
    }

    /// Run the merge core over the supplied tables.
    ///
    /// # Errors
    ///
    /// Fatal conditions only: an unbuildable registry, or a required column
    /// missing from one of the source tables. Per-row problems are dropped,
    /// counted, and reported in the adapter logs.
    pub fn run(&self, tables: &SourceTables) -> Result<PipelineOutput> {
        let registry =
            EntityRegistry::from_reference(&tables.owid, &self.registry_options, &self.config)?;
        let ctx = LinkContext {
            registry: &registry,
            corrections: &self.corrections,
            config: &self.config,
        };

        let owid = OwidAdapter;
        let worldbank = WorldBankAdapter;
        let kaggle = KaggleAdapter;
        let unicef = UnicefAdapter;
        let who = WhoAdapter;
        let cdc = CdcAdapter::default();

        let mut inputs: Vec<(&dyn SourceAdapter, &RecordBatch)> = vec![
            (&owid, &tables.owid),
            (&worldbank, &tables.worldbank),
            (&kaggle, &tables.kaggle),
            (&unicef, &tables.unicef),
            (&who, &tables.who),
        ];
        match &tables.cdc {
            Some(batch) => inputs.push((&cdc, batch)),
            None => log::warn!("CDC table not supplied, skipping the nation-only source"),
        }

        let adapted = adapt_all(&inputs, &ctx)?;
        let adapter_logs: Vec<AdapterLog> =
            adapted.iter().map(|source| source.log.clone()).collect();

        let merged = merge_sources(adapted);
        let (table, reconcile_stats) = reconcile(merged, &registry);
        let report = audit(&table, &self.config.audit);
        let coverage = coverage_of(&table);

        log::info!(
            "run complete: {} rows, {} countries-years pruned",
            table.len(),
            reconcile_stats.rows_pruned
        );
        Ok(PipelineOutput {
            table,
            adapter_logs,
            reconcile: reconcile_stats,
            report,
            coverage,
        })
    }
}

/// Count non-null observations per metric column.
fn coverage_of(table: &FinalTable) -> Vec<SourceCoverage> {
    Source::ALL
        .iter()
        .map(|&source| SourceCoverage {
            source,
            rows_with_value: table
                .rows()
                .iter()
                .filter(|row| row.value(source).is_some())
                .count(),
        })
        .collect()
}
