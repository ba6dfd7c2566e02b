//! Configuration for a pipeline run.

/// Configuration shared by every stage of a run.
///
/// Built once, passed by reference; nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Earliest accepted observation year (inclusive)
    pub year_min: i32,
    /// Latest accepted observation year (inclusive)
    pub year_max: i32,
    /// Prefix marking synthetic aggregate codes in the reference source
    /// (continents, income groups, world totals)
    pub aggregate_prefix: String,
    /// Explicit code exclusions, for aggregates that carry no marker prefix
    pub excluded_codes: Vec<String>,
    /// Auditor thresholds
    pub audit: AuditConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year_min: 1950,
            year_max: 2024,
            aggregate_prefix: "OWID_".to_string(),
            excluded_codes: Vec::new(),
            audit: AuditConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Whether `year` falls inside the accepted observation window
    #[must_use]
    pub fn year_in_range(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }

    /// Whether a raw reference code denotes a synthetic aggregate
    #[must_use]
    pub fn is_aggregate_code(&self, code: &str) -> bool {
        code.starts_with(&self.aggregate_prefix)
            || self.excluded_codes.iter().any(|c| c == code)
    }
}

/// Thresholds for the read-only audit pass.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Lowest plausible metric value (inclusive)
    pub lower_bound: f64,
    /// Highest plausible metric value (inclusive)
    pub upper_bound: f64,
    /// Maximum tolerated absolute difference, in years, between two sources
    /// measuring the same quantity
    pub tolerance_years: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            lower_bound: 13.0,
            upper_bound: 95.0,
            tolerance_years: 2.5,
        }
    }
}
