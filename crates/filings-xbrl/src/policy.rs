//! Named tie-break policies.
//!
//! These selection rules are heuristics, not accounting truths. Keeping
//! them as standalone, tested functions makes that visible and lets a
//! caller swap them out.
//!
//! Values are compared in reported units: the `decimals`/`scale`
//! attributes are not applied before magnitude comparison.

use std::collections::BTreeMap;

use filings_core::SourceTrace;

/// Maximum relative gap at which `Assets = Liabilities + Equity` is
/// considered satisfied, in percent.
pub const IDENTITY_TOLERANCE_PCT: f64 = 1.0;

/// Core concepts a year must mostly cover to enter a time series.
pub const CORE_CONCEPTS: [&str; 4] = ["Assets", "Revenue", "NetIncome", "Equity"];

/// How many of [`CORE_CONCEPTS`] a year needs (relaxed from all four, to
/// tolerate filers that omit one core concept in a given year).
pub const CORE_CONCEPTS_REQUIRED: usize = 3;

/// Picks among duplicate facts that share one tag and one context.
///
/// Duplicate tagging is common for dimensional roll-ups even within one
/// context id; the largest absolute value is assumed to be the most
/// consolidated figure (or the most recent restatement). Returns the index
/// of the winner; ties keep the first encountered.
#[must_use]
pub fn pick_duplicate_fact(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.iter().enumerate() {
        let magnitude = value.abs();
        if best.is_none_or(|(_, b)| magnitude > b) {
            best = Some((idx, magnitude));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Probe of the accounting identity inside one candidate context.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextProbe {
    /// The candidate context id.
    pub context_id: String,
    /// Assets extracted from this context, if present.
    pub assets: Option<f64>,
    /// Liabilities extracted from this context, if present.
    pub liabilities: Option<f64>,
    /// Equity extracted from this context, if present.
    pub equity: Option<f64>,
}

impl ContextProbe {
    /// Relative identity gap in percent, when all three figures exist.
    #[must_use]
    pub fn identity_gap(&self) -> Option<f64> {
        match (self.assets, self.liabilities, self.equity) {
            (Some(a), Some(l), Some(e)) => Some(identity_gap_pct(a, l, e)),
            _ => None,
        }
    }
}

/// Disambiguates several consolidated instant contexts sharing the target
/// date (restated filings).
///
/// Prefers the candidate under which `Assets = Liabilities + Equity` holds
/// within [`IDENTITY_TOLERANCE_PCT`]; among several that do, the one with
/// the largest Assets. When no candidate balances, falls back to the first
/// in document order. Returns the index of the winner.
#[must_use]
pub fn pick_balance_context(probes: &[ContextProbe]) -> Option<usize> {
    if probes.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, probe) in probes.iter().enumerate() {
        let balances = probe
            .identity_gap()
            .is_some_and(|gap| gap <= IDENTITY_TOLERANCE_PCT);
        if !balances {
            continue;
        }
        let assets = probe.assets.unwrap_or(0.0);
        if best.is_none_or(|(_, b)| assets > b) {
            best = Some((idx, assets));
        }
    }

    Some(best.map_or(0, |(idx, _)| idx))
}

/// Relative gap of `Assets = Liabilities + Equity`, in percent of Assets.
#[must_use]
pub fn identity_gap_pct(assets: f64, liabilities: f64, equity: f64) -> f64 {
    if assets == 0.0 {
        return f64::INFINITY;
    }
    ((assets - (liabilities + equity)).abs() / assets.abs()) * 100.0
}

/// The relaxed core-field inclusion rule for time series: at least
/// [`CORE_CONCEPTS_REQUIRED`] of [`CORE_CONCEPTS`] present.
#[must_use]
pub fn has_core_coverage(facts: &BTreeMap<String, SourceTrace>) -> bool {
    CORE_CONCEPTS
        .iter()
        .filter(|concept| facts.contains_key(**concept))
        .count()
        >= CORE_CONCEPTS_REQUIRED
}
