//! Core data types for XBRL fact extraction.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Section`] - Financial statement section
//! - [`SourceTrace`] - An extracted value with full provenance
//! - [`Period`] / [`XbrlContext`] - One reporting context of a document
//! - [`FiscalPeriod`] - The fiscal year a document reports on
//! - [`MappingGap`] - Audit record for a concept that failed to map

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Financial statement section a fact was extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Balance sheet (point-in-time facts).
    BalanceSheet,
    /// Income statement (annual duration facts).
    IncomeStatement,
    /// Cash flow statement (annual duration facts).
    CashFlow,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::CashFlow => "cash_flow",
        };
        write!(f, "{name}")
    }
}

/// An extracted financial value with full provenance metadata.
///
/// Immutable once created; owned exclusively by the year-record that
/// produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceTrace {
    /// The XBRL tag the value was read from (e.g. `us-gaap:NetIncomeLoss`).
    pub xbrl_tag: String,
    /// The value as reported, in the filing's own units.
    pub raw_value: f64,
    /// Id of the reporting context the value was read from.
    pub context_id: String,
    /// Statement section the value belongs to.
    pub section: Section,
    /// When the value was extracted.
    pub extracted_at: DateTime<Utc>,
}

impl SourceTrace {
    /// Creates a trace for a value extracted right now.
    #[must_use]
    pub fn new(
        xbrl_tag: impl Into<String>,
        raw_value: f64,
        context_id: impl Into<String>,
        section: Section,
    ) -> Self {
        Self {
            xbrl_tag: xbrl_tag.into(),
            raw_value,
            context_id: context_id.into(),
            section,
            extracted_at: Utc::now(),
        }
    }
}

/// The period covered by a reporting context.
///
/// XBRL contexts are either a point in time or a date range; the sum type
/// makes "exactly one of the two" structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// A point-in-time context (balance sheet dates).
    Instant(NaiveDate),
    /// A date-range context (income and cash flow periods).
    Duration {
        /// First day of the period.
        start: NaiveDate,
        /// Last day of the period.
        end: NaiveDate,
    },
}

/// One reporting context extracted from an XBRL instance document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlContext {
    /// The context's `id` attribute, referenced by facts via `contextRef`.
    pub id: String,
    /// The period the context covers.
    pub period: Period,
    /// Whether the context carries a `<segment>` element. Segmented
    /// (dimensional) contexts are always excluded from candidate selection.
    pub has_segment: bool,
}

impl XbrlContext {
    /// A context is consolidated iff it has no segment.
    #[must_use]
    pub fn is_consolidated(&self) -> bool {
        !self.has_segment
    }

    /// The instant date, if this is a point-in-time context.
    #[must_use]
    pub fn instant_date(&self) -> Option<NaiveDate> {
        match self.period {
            Period::Instant(date) => Some(date),
            Period::Duration { .. } => None,
        }
    }

    /// The (start, end) dates, if this is a duration context.
    #[must_use]
    pub fn duration(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self.period {
            Period::Instant(_) => None,
            Period::Duration { start, end } => Some((start, end)),
        }
    }

    /// Number of days a duration context spans.
    #[must_use]
    pub fn span_days(&self) -> Option<i64> {
        self.duration().map(|(start, end)| (end - start).num_days())
    }
}

/// The fiscal year a document reports on, derived once per document.
///
/// Every fact extracted from a document belongs to exactly one fiscal
/// period; comparative-year facts are not extracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Calendar year of the fiscal year end.
    pub year: i32,
    /// The fiscal year-end date.
    pub year_end: NaiveDate,
}

/// Audit record for a concept that could not be mapped to any document tag.
///
/// Accumulated append-only by a fuzzy mapper over one document parse and
/// rendered into a human-readable report for taxonomy maintenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingGap {
    /// The concept that failed to map.
    pub concept: String,
    /// Aliases that were tried, in order.
    pub attempted_aliases: Vec<String>,
    /// Sample of tags actually available in the document.
    pub available_tags: Vec<String>,
    /// Free-text context (entity, section, year).
    pub note: String,
}
