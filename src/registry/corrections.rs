//! Name-variant corrections applied before registry lookup.
//!
//! Different publishers spell the same country differently (official long
//! forms, transliterations, the occasional upstream typo). Centralising the
//! corrections in one table means a fix added for one source benefits every
//! source, and the whole correction set stays auditable as a single artifact.

use rustc_hash::FxHashMap;

/// Variant spellings observed across the six sources, mapped to the display
/// name the reference source uses. Literal-string keyed: no fuzzy matching,
/// unmatched names pass through and fail the registry lookup downstream.
const UNIVERSAL_CORRECTIONS: &[(&str, &str)] = &[
    ("United States of America", "United States"),
    ("United Kingdom of Great Britain and Northern Ireland", "United Kingdom"),
    ("Russian Federation", "Russia"),
    ("Syrian Arab Republic", "Syria"),
    ("Türkiye", "Turkey"),
    ("United Republic of Tanzania", "Tanzania"),
    ("Venezuela (Bolivarian Republic of)", "Venezuela"),
    ("Venezuella (Bolivarian Republic of)", "Venezuela"),
    ("Viet Nam", "Vietnam"),
    ("Timor-Leste", "East Timor"),
    ("Republic of Moldova", "Moldova"),
    ("Micronesia", "Micronesia (country)"),
    ("Micronesia (Federated States of)", "Micronesia (country)"),
    ("Micronesia (Federatedd States of)", "Micronesia (country)"),
    ("Bolivia (Plurinational State of)", "Bolivia"),
    ("Iran (Islamic Republic of)", "Iran"),
    ("Democratic People's Republic of Korea", "North Korea"),
    ("Republic of Korea", "South Korea"),
    ("Lao People's Democratic Republic", "Laos"),
    ("Côte d'Ivoire", "Cote d'Ivoire"),
    ("Czechia", "Czech Republic"),
    ("Democratic Republic of the Congo", "Democratic Republic of Congo"),
    ("Cabo Verde", "Cape Verde"),
    ("Brunei Darussalam", "Brunei"),
    ("Swaziland", "Eswatini"),
    ("The former Yugoslav republic of Macedonia", "North Macedonia"),
];

/// Lookup-or-passthrough table of display-name corrections.
///
/// Built once per run and read-only thereafter. Many variants may map to the
/// same canonical name; every right-hand side is itself canonical, which
/// makes [`NameCorrections::normalize`] idempotent.
#[derive(Debug, Clone)]
pub struct NameCorrections {
    map: FxHashMap<String, String>,
}

impl Default for NameCorrections {
    fn default() -> Self {
        let map = UNIVERSAL_CORRECTIONS
            .iter()
            .map(|(variant, canonical)| ((*variant).to_string(), (*canonical).to_string()))
            .collect();
        Self { map }
    }
}

impl NameCorrections {
    /// An empty table (every name passes through)
    #[must_use]
    pub fn empty() -> Self {
        Self { map: FxHashMap::default() }
    }

    /// Add or replace a single correction
    #[must_use]
    pub fn with_correction(mut self, variant: &str, canonical: &str) -> Self {
        self.map.insert(variant.to_string(), canonical.to_string());
        self
    }

    /// Normalize a raw display name: trim surrounding whitespace, then apply
    /// the correction table. A name with no entry passes through unchanged.
    /// Pure, O(1), never fails.
    #[must_use]
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        let trimmed = raw.trim();
        self.map.get(trimmed).map_or(trimmed, String::as_str)
    }

    /// Number of known variants
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table holds no corrections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
