//! Error handling for the merge core.

use arrow::error::ArrowError;

/// Errors that can abort a pipeline run.
///
/// Per-row problems (unmappable names, non-numeric values, out-of-range
/// years) are never errors; adapters drop and count them. Only structural
/// defects in the input tables surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structurally required column is absent from an input table
    #[error("table '{table}': required column '{column}' not found")]
    ColumnNotFound {
        /// Which input table was being read
        table: String,
        /// The missing column
        column: String,
    },

    /// A column exists but carries a type the adapter cannot read
    #[error("table '{table}': column '{column}' has type {actual}, expected {expected}")]
    ColumnType {
        /// Which input table was being read
        table: String,
        /// The offending column
        column: String,
        /// The type the adapter expected
        expected: &'static str,
        /// The type the column actually carries
        actual: String,
    },

    /// The reference table produced zero canonical entities
    #[error("reference table yielded no canonical entities; nothing downstream can link")]
    EmptyRegistry,

    /// A country code was not a 3-character alphabetic identifier
    #[error("invalid country code '{0}'")]
    InvalidCountryCode(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Alias for Result with the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
