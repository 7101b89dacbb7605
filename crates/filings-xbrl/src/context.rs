//! Reporting-context resolution.
//!
//! A 10-K carries many overlapping contexts: comparative years, segments,
//! quarterly periods, and cover-page metadata dated at the filing date.
//! XBRL gives no single authoritative "this is the current year" signal,
//! so the [`ContextManager`] infers it: the filing date is almost always
//! the most recent instant date in the document, which makes the
//! second-most-recent distinct consolidated instant date the fiscal year
//! end.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use filings_core::{FilingError, FiscalPeriod, Result, XbrlContext};

use crate::document::XbrlDocument;

/// Annual duration window in days, tolerant of 52/53-week fiscal years.
const ANNUAL_SPAN_DAYS: std::ops::RangeInclusive<i64> = 350..=370;

/// Resolved contexts for one fiscal year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearContexts {
    /// The fiscal year.
    pub year: i32,
    /// Context id holding the year's balance-sheet facts.
    pub balance_context: String,
    /// The balance-sheet (instant) date.
    pub balance_date: NaiveDate,
    /// Context id holding the year's income-statement facts, when an
    /// annual duration context exists for the year.
    pub income_context: Option<String>,
    /// The (start, end) of the income context's period.
    pub income_period: Option<(NaiveDate, NaiveDate)>,
}

/// Identifies the fiscal year of a document and resolves the balance-sheet
/// and income-statement context for any available year.
///
/// One instance per document parse. Resolution is lazy and cached; a
/// failed resolution for one year never poisons the instance — another
/// year may still resolve.
#[derive(Debug)]
pub struct ContextManager {
    contexts: Vec<XbrlContext>,
    fiscal: OnceLock<Option<FiscalPeriod>>,
    years: OnceLock<BTreeMap<i32, YearContexts>>,
}

impl ContextManager {
    /// Builds a manager over a parsed document's contexts.
    #[must_use]
    pub fn new(document: &XbrlDocument) -> Self {
        Self::from_contexts(document.contexts().to_vec())
    }

    /// Builds a manager from an explicit context table.
    #[must_use]
    pub fn from_contexts(contexts: Vec<XbrlContext>) -> Self {
        Self {
            contexts,
            fiscal: OnceLock::new(),
            years: OnceLock::new(),
        }
    }

    /// The fiscal period of the document (most recent fiscal year).
    ///
    /// # Errors
    /// [`FilingError::FiscalPeriodNotFound`] when the document has no
    /// consolidated instant context at all.
    pub fn fiscal_period(&self) -> Result<FiscalPeriod> {
        (*self.fiscal.get_or_init(|| self.identify_fiscal_period()))
            .ok_or(FilingError::FiscalPeriodNotFound)
    }

    /// The most recent fiscal year in the document.
    pub fn fiscal_year(&self) -> Result<i32> {
        self.fiscal_period().map(|p| p.year)
    }

    /// The most recent fiscal year-end date in the document.
    pub fn fiscal_year_end(&self) -> Result<NaiveDate> {
        self.fiscal_period().map(|p| p.year_end)
    }

    /// Collects consolidated instant dates, newest first, and picks the
    /// second-most-recent distinct date: the newest is almost always the
    /// filing date from cover-page metadata contexts, not the year end.
    fn identify_fiscal_period(&self) -> Option<FiscalPeriod> {
        let mut dates: Vec<NaiveDate> = self
            .contexts
            .iter()
            .filter(|c| c.is_consolidated())
            .filter_map(XbrlContext::instant_date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        if dates.is_empty() {
            warn!("no consolidated instant contexts; cannot identify fiscal period");
            return None;
        }

        let year_end = if dates.len() >= 2 { dates[1] } else { dates[0] };
        let period = FiscalPeriod {
            year: year_end.year(),
            year_end,
        };
        info!(year = period.year, year_end = %period.year_end, "fiscal period identified");
        Some(period)
    }

    /// Per-year context table, built once on first use.
    ///
    /// Every context dated at the most recent distinct instant date (the
    /// filing date) is excluded before grouping by calendar year.
    fn year_table(&self) -> &BTreeMap<i32, YearContexts> {
        self.years.get_or_init(|| {
            let mut instants: Vec<&XbrlContext> = self
                .contexts
                .iter()
                .filter(|c| c.is_consolidated() && c.instant_date().is_some())
                .collect();
            // Stable sort keeps document order within equal dates.
            instants.sort_by_key(|c| std::cmp::Reverse(c.instant_date()));

            let Some(filing_date) = instants.first().and_then(|c| c.instant_date()) else {
                return BTreeMap::new();
            };
            let has_older = instants
                .iter()
                .any(|c| c.instant_date() != Some(filing_date));
            if has_older {
                debug!(excluded = %filing_date, "filing date excluded from year table");
                instants.retain(|c| c.instant_date() != Some(filing_date));
            }

            let mut table: BTreeMap<i32, YearContexts> = BTreeMap::new();
            for context in instants {
                let date = context.instant_date().unwrap_or_default();
                let year = date.year();
                // First entry per year wins: the newest date in that year.
                table.entry(year).or_insert_with(|| {
                    let (income_context, income_period) =
                        match self.find_annual_duration_ending(date) {
                            Some(c) => (Some(c.id.clone()), c.duration()),
                            None => (None, None),
                        };
                    YearContexts {
                        year,
                        balance_context: context.id.clone(),
                        balance_date: date,
                        income_context,
                        income_period,
                    }
                });
            }

            info!(years = ?table.keys().rev().collect::<Vec<_>>(), "multi-year contexts resolved");
            table
        })
    }

    /// The consolidated annual duration context ending exactly on `end`,
    /// preferring the span closest to 365 days; ties go to the context
    /// declared first in the document.
    fn find_annual_duration_ending(&self, end: NaiveDate) -> Option<&XbrlContext> {
        self.contexts
            .iter()
            .filter(|c| c.is_consolidated())
            .filter(|c| c.duration().is_some_and(|(_, e)| e == end))
            .filter(|c| c.span_days().is_some_and(|d| ANNUAL_SPAN_DAYS.contains(&d)))
            .min_by_key(|c| (c.span_days().unwrap_or(0) - 365).abs())
    }

    /// Context id for balance-sheet facts: the consolidated instant context
    /// dated at the fiscal year end (of `year`, or the most recent year
    /// when `None`).
    pub fn balance_context(&self, year: Option<i32>) -> Result<String> {
        match year {
            None => {
                let target = self.fiscal_year_end()?;
                let id = self
                    .contexts
                    .iter()
                    .find(|c| c.is_consolidated() && c.instant_date() == Some(target))
                    .map(|c| c.id.clone())
                    .ok_or_else(|| FilingError::ContextNotFound {
                        wanted: "balance (instant)".to_string(),
                        target: target.to_string(),
                    })?;
                debug!(context_id = %id, date = %target, "balance context resolved");
                Ok(id)
            }
            Some(year) => self
                .year_table()
                .get(&year)
                .map(|y| y.balance_context.clone())
                .ok_or_else(|| FilingError::ContextNotFound {
                    wanted: "balance (instant)".to_string(),
                    target: format!("fiscal year {year}"),
                }),
        }
    }

    /// All consolidated instant context ids sharing the target year's
    /// balance-sheet date, in document order.
    ///
    /// Normally a single id; restated filings can produce several, which
    /// the parser disambiguates against the accounting identity.
    pub fn balance_context_candidates(&self, year: Option<i32>) -> Result<Vec<String>> {
        let target = match year {
            None => self.fiscal_year_end()?,
            Some(year) => {
                self.year_table()
                    .get(&year)
                    .ok_or_else(|| FilingError::ContextNotFound {
                        wanted: "balance (instant)".to_string(),
                        target: format!("fiscal year {year}"),
                    })?
                    .balance_date
            }
        };
        Ok(self
            .contexts
            .iter()
            .filter(|c| c.is_consolidated() && c.instant_date() == Some(target))
            .map(|c| c.id.clone())
            .collect())
    }

    /// Context id for income-statement (and cash-flow) facts: the
    /// consolidated annual duration context ending at the target year's
    /// fiscal year end.
    pub fn income_context(&self, year: Option<i32>) -> Result<String> {
        let target_end = match year {
            None => self.fiscal_year_end()?,
            Some(year) => {
                return self
                    .year_table()
                    .get(&year)
                    .and_then(|y| y.income_context.clone())
                    .ok_or_else(|| FilingError::ContextNotFound {
                        wanted: "income (annual duration)".to_string(),
                        target: format!("fiscal year {year}"),
                    });
            }
        };
        let context = self.find_annual_duration_ending(target_end).ok_or_else(|| {
            FilingError::ContextNotFound {
                wanted: "income (annual duration)".to_string(),
                target: target_end.to_string(),
            }
        })?;
        debug!(
            context_id = %context.id,
            span_days = context.span_days().unwrap_or(0),
            "income context resolved"
        );
        Ok(context.id.clone())
    }

    /// Whether the id names a point-in-time context.
    #[must_use]
    pub fn is_instant_context(&self, context_id: &str) -> bool {
        self.find(context_id)
            .is_some_and(|c| c.instant_date().is_some())
    }

    /// Whether the id names a duration context.
    #[must_use]
    pub fn is_duration_context(&self, context_id: &str) -> bool {
        self.find(context_id).is_some_and(|c| c.duration().is_some())
    }

    /// Fiscal years with at least one consolidated instant context,
    /// descending. Supports multi-year single-document filings.
    #[must_use]
    pub fn available_years(&self) -> Vec<i32> {
        self.year_table().keys().rev().copied().collect()
    }

    /// The resolved context summary for one fiscal year.
    pub fn year_summary(&self, year: i32) -> Result<YearContexts> {
        self.year_table()
            .get(&year)
            .cloned()
            .ok_or_else(|| FilingError::ContextNotFound {
                wanted: "balance (instant)".to_string(),
                target: format!("fiscal year {year}"),
            })
    }

    /// Every consolidated (non-segmented) context id. Debug/audit listing.
    #[must_use]
    pub fn all_consolidated_contexts(&self) -> Vec<String> {
        self.contexts
            .iter()
            .filter(|c| c.is_consolidated())
            .map(|c| c.id.clone())
            .collect()
    }

    fn find(&self, context_id: &str) -> Option<&XbrlContext> {
        self.contexts.iter().find(|c| c.id == context_id)
    }
}
