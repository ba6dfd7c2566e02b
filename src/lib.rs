//! A Rust library for linking and merging multi-source country health
//! statistics into one longitudinal table keyed by country and year.
//!
//! Six independently published datasets disagree on schema, encoding and
//! country naming. This crate resolves the naming problem through a single
//! canonical entity registry plus a centralised correction table, coerces
//! each source into a common record shape, outer-joins the results on
//! `(code, year)`, and audits the merged table, without mutating it, for
//! implausible values and cross-source conflicts. File acquisition, parsing
//! and export serialization live in external collaborators; this core works
//! entirely on in-memory Arrow tables.

pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod registry;
pub mod source;

// Re-export the most common types for easier use
// Core types
pub use config::{AuditConfig, PipelineConfig};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOutput, SourceCoverage, SourceTables};

// Linkage
pub use registry::{CountryCode, EntityRegistry, NameCorrections, RegistryOptions};

// Adaptation and merging
pub use merge::{FinalTable, MergedRow, MergedTable, ReconcileStats, merge_sources, reconcile};
pub use source::{AdaptedSource, AdapterLog, Source, SourceAdapter, SourceRecord};

// Auditing
pub use audit::{AuditReport, BoundsViolation, DirectionalViolation, ToleranceConflict, audit};

// Arrow types
pub use arrow::record_batch::RecordBatch;
