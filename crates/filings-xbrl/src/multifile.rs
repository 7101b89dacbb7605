//! Multi-year time-series assembly across per-year filings.
//!
//! One filer, one directory, one XBRL document per fiscal year. Filenames
//! are matched against a per-filer pattern whose optional year capture
//! names the fiscal year (the token-less filename is the most recent
//! filing). Each year is parsed completely independently; a year that
//! fails to load or lacks core coverage is skipped, never aborting the
//! batch.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use filings_core::{FilingError, Result, SourceTrace, Taxonomy};

use crate::parser::XbrlParser;
use crate::policy;

/// Filename convention of one filer's archived filings.
#[derive(Clone, Debug)]
pub struct FilerPattern {
    /// Filename regex with an optional capture group for the fiscal year.
    pub regex: Regex,
    /// Year assigned to a filename whose year group is absent (the
    /// "most recent, no token" convention).
    pub default_year: i32,
}

impl FilerPattern {
    /// Builds a pattern from a regex source string.
    pub fn new(pattern: &str, default_year: i32) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| FilingError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            regex,
            default_year,
        })
    }

    /// The fiscal year a filename maps to, when it matches at all.
    #[must_use]
    pub fn year_of(&self, filename: &str) -> Option<i32> {
        let captures = self.regex.captures(filename)?;
        match captures.get(1) {
            Some(year) => year.as_str().parse().ok(),
            None => Some(self.default_year),
        }
    }
}

/// Registry of per-filer filename patterns.
#[derive(Clone, Debug, Default)]
pub struct FilerPatterns {
    patterns: HashMap<String, FilerPattern>,
}

impl FilerPatterns {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in registry.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.insert(
            "AAPL",
            FilerPattern::new(r"^apple_10k(?:_(\d{4}))?_xbrl\.xml$", 2025)
                .expect("built-in pattern is valid"),
        );
        registry
    }

    /// Registers (or replaces) a filer's pattern.
    pub fn insert(&mut self, filer: &str, pattern: FilerPattern) {
        self.patterns.insert(filer.to_uppercase(), pattern);
    }

    /// Looks up a filer's pattern, case-insensitively.
    #[must_use]
    pub fn get(&self, filer: &str) -> Option<&FilerPattern> {
        self.patterns.get(&filer.to_uppercase())
    }
}

/// Assembles a multi-year time series for one filer from per-year
/// documents in a directory.
#[derive(Debug)]
pub struct MultiFileXbrlParser {
    filer: String,
    taxonomy: Arc<Taxonomy>,
    files: BTreeMap<i32, PathBuf>,
    gap_reports: BTreeMap<i32, String>,
}

impl MultiFileXbrlParser {
    /// Discovers the filer's documents using the built-in pattern registry.
    ///
    /// # Errors
    /// [`FilingError::UnknownFiler`] when no pattern is configured for the
    /// filer (checked before any file is touched);
    /// [`FilingError::DataDir`] when the directory does not exist;
    /// [`FilingError::FilingsNotFound`] when nothing matches the pattern.
    pub fn new(filer: &str, data_dir: impl AsRef<Path>, taxonomy: Arc<Taxonomy>) -> Result<Self> {
        Self::with_patterns(filer, data_dir, taxonomy, &FilerPatterns::standard())
    }

    /// Discovers the filer's documents using an explicit pattern registry.
    pub fn with_patterns(
        filer: &str,
        data_dir: impl AsRef<Path>,
        taxonomy: Arc<Taxonomy>,
        patterns: &FilerPatterns,
    ) -> Result<Self> {
        let filer = filer.to_uppercase();
        // Configuration is validated before the filesystem is touched.
        let pattern = patterns
            .get(&filer)
            .ok_or_else(|| FilingError::UnknownFiler(filer.clone()))?;

        let data_dir = data_dir.as_ref();
        if !data_dir.is_dir() {
            return Err(FilingError::DataDir(data_dir.to_path_buf()));
        }

        let files = discover_files(data_dir, pattern)?;
        if files.is_empty() {
            return Err(FilingError::FilingsNotFound {
                filer,
                dir: data_dir.to_path_buf(),
            });
        }

        info!(
            filer,
            files = files.len(),
            years = ?files.keys().rev().collect::<Vec<_>>(),
            "filings discovered"
        );

        Ok(Self {
            filer,
            taxonomy,
            files,
            gap_reports: BTreeMap::new(),
        })
    }

    /// The filer this parser was built for.
    #[must_use]
    pub fn filer(&self) -> &str {
        &self.filer
    }

    /// Fiscal years with a discovered document, descending.
    #[must_use]
    pub fn available_years(&self) -> Vec<i32> {
        self.files.keys().rev().copied().collect()
    }

    /// The discovered year → path map.
    #[must_use]
    pub fn files(&self) -> &BTreeMap<i32, PathBuf> {
        &self.files
    }

    /// Extracts a time series over the `years` most recent discovered
    /// years, optionally filtered to a set of concepts.
    ///
    /// Each year gets its own parser (nothing is shared between years).
    /// A year is included only when it passes the relaxed core-field rule
    /// ([`policy::has_core_coverage`]); years that fail to load or fall
    /// short are skipped with a warning and processing continues.
    pub fn extract_timeseries(
        &mut self,
        years: usize,
        fields: Option<&[&str]>,
    ) -> BTreeMap<i32, BTreeMap<String, SourceTrace>> {
        let targets: Vec<i32> = self.available_years().into_iter().take(years).collect();
        let mut series = BTreeMap::new();

        for year in targets {
            let Some(path) = self.files.get(&year) else {
                continue;
            };

            let mut parser = match XbrlParser::load(path, Arc::clone(&self.taxonomy)) {
                Ok(parser) => parser,
                Err(e) => {
                    warn!(year, path = %path.display(), error = %e, "year skipped: load failed");
                    continue;
                }
            };

            let mut facts = parser.extract_all().flatten();
            self.gap_reports.insert(year, parser.mapping_gaps_report());

            if !policy::has_core_coverage(&facts) {
                warn!(year, fields = facts.len(), "year skipped: core fields incomplete");
                continue;
            }

            if let Some(wanted) = fields {
                facts.retain(|concept, _| wanted.contains(&concept.as_str()));
            }

            info!(year, fields = facts.len(), "year extracted");
            series.insert(year, facts);
        }

        info!(
            extracted = series.len(),
            "time-series extraction complete"
        );
        series
    }

    /// Checks `Assets = Liabilities + Equity` (within 1%) for every year
    /// of a time series.
    ///
    /// The report flags years for manual review; it never excludes them.
    #[must_use]
    pub fn validate_balance_sheets(
        &self,
        timeseries: &BTreeMap<i32, BTreeMap<String, SourceTrace>>,
    ) -> BTreeMap<i32, bool> {
        let mut results = BTreeMap::new();
        for (&year, facts) in timeseries {
            let ok = match (facts.get("Assets"), facts.get("Liabilities"), facts.get("Equity")) {
                (Some(assets), Some(liabilities), Some(equity)) => {
                    let gap = policy::identity_gap_pct(
                        assets.raw_value,
                        liabilities.raw_value,
                        equity.raw_value,
                    );
                    gap <= policy::IDENTITY_TOLERANCE_PCT
                }
                _ => false,
            };
            if !ok {
                warn!(year, "balance sheet needs manual review");
            }
            results.insert(year, ok);
        }
        results
    }

    /// Merges the per-year mapping-gap reports into one actionable text.
    #[must_use]
    pub fn consolidated_gaps_report(&self) -> String {
        let with_gaps: Vec<(i32, &String)> = self
            .gap_reports
            .iter()
            .rev()
            .filter(|(_, report)| !report.contains("No mapping gaps"))
            .map(|(&year, report)| (year, report))
            .collect();

        if with_gaps.is_empty() {
            return "No mapping gaps detected across all years".to_string();
        }

        let mut out = Vec::new();
        for (year, report) in with_gaps {
            out.push(format!("\n[{year}]"));
            out.push(report.clone());
        }
        out.push("\nACTION REQUIRED: review gaps and update the taxonomy map".to_string());
        out.join("\n")
    }
}

/// Maps discovered filenames to fiscal years.
fn discover_files(dir: &Path, pattern: &FilerPattern) -> Result<BTreeMap<i32, PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| FilingError::FileLoad {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = BTreeMap::new();
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(year) = pattern.year_of(name) {
            files.insert(year, path);
        }
    }
    Ok(files)
}
