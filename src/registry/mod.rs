//! Canonical entity registry.
//!
//! Builds the single authoritative mapping between country display names and
//! stable ISO-3166 alpha-3 codes from the reference source, and the reverse
//! code-to-name lookup every later stage trusts. Constructed once per run,
//! read-only afterwards.

pub mod corrections;

pub use corrections::NameCorrections;

use std::fmt;

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::source::extract;

/// A 3-character uppercase country identifier (ISO-3166 alpha-3 convention).
///
/// Immutable once constructed; half of every row's composite key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode([u8; 3]);

impl CountryCode {
    /// Parse and validate a raw code string.
    ///
    /// Accepts exactly three ASCII alphabetic characters; lowercase input is
    /// uppercased. Anything else is rejected, which is how native-code
    /// adapters detect junk identifiers.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(Error::InvalidCountryCode(trimmed.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    /// Construct from a compile-time literal, e.g. `CountryCode::from_ascii(*b"USA")`.
    ///
    /// Caller supplies uppercase ASCII; intended for fixed-entity sources.
    #[must_use]
    pub const fn from_ascii(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII, so this cannot fail
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountryCode({})", self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Options for building the registry from the reference table.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Column holding the display name in the reference table
    pub name_column: String,
    /// Column holding the country code in the reference table
    pub code_column: String,
    /// Display-name overrides keyed by code, applied before the registry is
    /// frozen. Keying by code rather than by name survives typos, stray
    /// whitespace and capitalisation drift in the reference source.
    pub name_overrides: Vec<(String, String)>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            name_column: "Entity".to_string(),
            code_column: "Code".to_string(),
            name_overrides: Vec::new(),
        }
    }
}

/// The forward and reverse canonical-entity maps.
///
/// `code_of` is a bijection restricted to genuine countries: synthetic
/// aggregate codes (regions, income groups, world totals) are excluded at
/// build time.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    code_of: FxHashMap<String, CountryCode>,
    name_of: FxHashMap<CountryCode, String>,
}

impl EntityRegistry {
    /// Build the registry from the reference source's raw rows.
    ///
    /// Rows with a null or empty code are skipped, as are rows whose code
    /// matches the aggregate prefix or exclusion set. The first
    /// `(name, code)` pair per distinct display name wins; the reference
    /// source is assumed internally consistent.
    ///
    /// # Errors
    ///
    /// `Error::EmptyRegistry` if no valid pair survives; fatal, nothing
    /// downstream can link without the registry.
    pub fn from_reference(
        batch: &RecordBatch,
        opts: &RegistryOptions,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let names = extract::string_column(batch, "reference", &opts.name_column)?;
        let codes = extract::string_column(batch, "reference", &opts.code_column)?;

        let mut code_of = FxHashMap::default();
        let mut name_of = FxHashMap::default();

        for (name, code) in names.iter().zip(codes.iter()) {
            let (Some(name), Some(code)) = (name, code) else {
                continue;
            };
            let name = name.trim();
            let code = code.trim();
            if name.is_empty() || code.is_empty() || config.is_aggregate_code(code) {
                continue;
            }
            let Ok(code) = CountryCode::new(code) else {
                log::warn!("reference row '{name}' carries malformed code '{code}', skipping");
                continue;
            };
            if code_of.contains_key(name) {
                continue; // first occurrence wins
            }
            code_of.insert(name.to_string(), code);
            name_of.entry(code).or_insert_with(|| name.to_string());
        }

        if code_of.is_empty() {
            return Err(Error::EmptyRegistry);
        }

        let mut registry = Self { code_of, name_of };
        registry.apply_name_overrides(&opts.name_overrides);
        log::info!(
            "entity registry built: {} names mapped to {} codes",
            registry.code_of.len(),
            registry.name_of.len()
        );
        Ok(registry)
    }

    /// Overwrite display names by code, before the registry is handed out.
    ///
    /// Keeps the registry the single name authority: downstream backfill
    /// still reads `name_of`, so the `displayName == nameOf(code)` invariant
    /// holds for overridden entities too.
    fn apply_name_overrides(&mut self, overrides: &[(String, String)]) {
        for (raw_code, display) in overrides {
            let Ok(code) = CountryCode::new(raw_code) else {
                log::warn!("name override for malformed code '{raw_code}' ignored");
                continue;
            };
            match self.name_of.get_mut(&code) {
                Some(name) => {
                    log::info!("display name override: {code} -> \"{display}\"");
                    *name = display.clone();
                }
                None => log::warn!("name override for unknown code '{code}' ignored"),
            }
        }
    }

    /// Look up the code for a (already normalized) display name
    #[must_use]
    pub fn code_of(&self, display_name: &str) -> Option<CountryCode> {
        self.code_of.get(display_name).copied()
    }

    /// Look up the canonical display name for a code
    #[must_use]
    pub fn name_of(&self, code: CountryCode) -> Option<&str> {
        self.name_of.get(&code).map(String::as_str)
    }

    /// Whether `code` belongs to a canonical entity
    #[must_use]
    pub fn contains(&self, code: CountryCode) -> bool {
        self.name_of.contains_key(&code)
    }

    /// Number of distinct display names mapped
    #[must_use]
    pub fn len(&self) -> usize {
        self.code_of.len()
    }

    /// Whether the registry is empty (never true for a built registry)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code_of.is_empty()
    }
}
