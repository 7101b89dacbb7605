//! Per-document extraction orchestration.
//!
//! [`XbrlParser`] binds one parsed instance document to a fresh
//! [`ContextManager`] and [`FuzzyMapper`] plus a shared taxonomy, and
//! produces the document's fact set for its fiscal year. Missing concepts
//! are represented as absence and recorded in the mapping-gap log, never
//! surfaced as errors; only a failed document load is fatal.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use filings_core::{MappingGap, Result, Section, SourceTrace, Taxonomy};

use crate::context::ContextManager;
use crate::document::XbrlDocument;
use crate::fuzzy::FuzzyMapper;
use crate::policy;
use crate::resolver::TaxonomyResolver;
use crate::schema::XbrlSchema;

/// The three statement sections of one document's fiscal year.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FactSet {
    /// Balance-sheet facts by concept.
    pub balance_sheet: BTreeMap<String, SourceTrace>,
    /// Income-statement facts by concept.
    pub income_statement: BTreeMap<String, SourceTrace>,
    /// Cash-flow facts by concept.
    pub cash_flow: BTreeMap<String, SourceTrace>,
}

impl FactSet {
    /// Looks a concept up across all three sections.
    #[must_use]
    pub fn get(&self, concept: &str) -> Option<&SourceTrace> {
        self.balance_sheet
            .get(concept)
            .or_else(|| self.income_statement.get(concept))
            .or_else(|| self.cash_flow.get(concept))
    }

    /// Merges the three sections into one concept → fact map. Concept
    /// names are unique across sections, so no key can collide.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, SourceTrace> {
        let mut merged = self.balance_sheet.clone();
        merged.extend(
            self.income_statement
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged.extend(self.cash_flow.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Total number of extracted facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balance_sheet.len() + self.income_statement.len() + self.cash_flow.len()
    }

    /// Whether no fact was extracted at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracts one document's fact set with full provenance.
pub struct XbrlParser {
    document: XbrlDocument,
    schema: Option<XbrlSchema>,
    contexts: ContextManager,
    resolver: TaxonomyResolver,
    fuzzy: FuzzyMapper,
}

impl std::fmt::Debug for XbrlParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XbrlParser")
            .field("document", &self.document.id())
            .field("schema", &self.schema.as_ref().map(XbrlSchema::len))
            .field("mapping_gaps", &self.fuzzy.gaps().len())
            .finish()
    }
}

impl XbrlParser {
    /// Loads an instance document from disk and binds the extraction
    /// subsystems to it.
    ///
    /// A companion `.xsd` schema in the same directory is loaded
    /// best-effort for extension-tag hierarchy traversal; its absence (or
    /// failure to parse) is logged, not fatal.
    ///
    /// # Errors
    /// [`FilingError::FileLoad`](filings_core::FilingError::FileLoad) when
    /// the file is unreadable or not well-formed XML.
    pub fn load(path: impl AsRef<Path>, taxonomy: Arc<Taxonomy>) -> Result<Self> {
        let path = path.as_ref();
        let document = XbrlDocument::load(path)?;
        let schema = discover_sibling_schema(path);
        info!(
            path = %path.display(),
            contexts = document.contexts().len(),
            facts = document.facts().len(),
            schema = schema.is_some(),
            "XBRL instance loaded"
        );
        Ok(Self::assemble(document, schema, taxonomy))
    }

    /// Builds a parser over an in-memory XML document (no schema).
    pub fn from_xml(xml: &str, taxonomy: Arc<Taxonomy>) -> Result<Self> {
        let document = XbrlDocument::parse_str(xml)?;
        Ok(Self::assemble(document, None, taxonomy))
    }

    /// Attaches an already-parsed schema, replacing any discovered one.
    #[must_use]
    pub fn with_schema(mut self, schema: XbrlSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn assemble(document: XbrlDocument, schema: Option<XbrlSchema>, taxonomy: Arc<Taxonomy>) -> Self {
        let contexts = ContextManager::new(&document);
        Self {
            document,
            schema,
            contexts,
            resolver: TaxonomyResolver::new(taxonomy),
            fuzzy: FuzzyMapper::default(),
        }
    }

    /// The underlying document.
    #[must_use]
    pub fn document(&self) -> &XbrlDocument {
        &self.document
    }

    /// The context manager bound to this document.
    #[must_use]
    pub fn context_manager(&self) -> &ContextManager {
        &self.contexts
    }

    /// The document's (most recent) fiscal year.
    pub fn fiscal_year(&self) -> Result<i32> {
        self.contexts.fiscal_year()
    }

    /// Fiscal years available in this document, descending.
    #[must_use]
    pub fn available_years(&self) -> Vec<i32> {
        self.contexts.available_years()
    }

    /// Extracts the balance sheet for the document's fiscal year.
    ///
    /// Context failures yield an empty map (logged), not an error.
    pub fn extract_balance_sheet(&mut self) -> BTreeMap<String, SourceTrace> {
        let facts = self.extract_section_for_year(Section::BalanceSheet, None);
        self.log_identity_check(&facts);
        facts
    }

    /// Extracts the income statement for the document's fiscal year.
    pub fn extract_income_statement(&mut self) -> BTreeMap<String, SourceTrace> {
        self.extract_section_for_year(Section::IncomeStatement, None)
    }

    /// Extracts the cash-flow statement for the document's fiscal year.
    /// Cash-flow concepts live in the same annual duration context as the
    /// income statement.
    pub fn extract_cash_flow(&mut self) -> BTreeMap<String, SourceTrace> {
        self.extract_section_for_year(Section::CashFlow, None)
    }

    /// Extracts all three sections for the document's fiscal year.
    pub fn extract_all(&mut self) -> FactSet {
        FactSet {
            balance_sheet: self.extract_balance_sheet(),
            income_statement: self.extract_income_statement(),
            cash_flow: self.extract_cash_flow(),
        }
    }

    /// Extracts every concept for one specific fiscal year, flattened
    /// across sections.
    ///
    /// Tolerant of partially resolvable years: when only one of the two
    /// contexts exists (e.g. the oldest comparative year has a balance
    /// date but no annual duration), the resolvable sections are still
    /// extracted.
    pub fn extract_year(&mut self, year: i32) -> BTreeMap<String, SourceTrace> {
        let mut facts = self.extract_section_for_year(Section::BalanceSheet, Some(year));
        facts.extend(self.extract_section_for_year(Section::IncomeStatement, Some(year)));
        facts.extend(self.extract_section_for_year(Section::CashFlow, Some(year)));
        facts
    }

    /// Extracts a time series from a single multi-year document.
    ///
    /// Takes the `years` most recent fiscal years available; a year enters
    /// the result only when it passes the relaxed core-field rule
    /// ([`policy::has_core_coverage`]).
    pub fn extract_timeseries(&mut self, years: usize) -> BTreeMap<i32, BTreeMap<String, SourceTrace>> {
        let available = self.available_years();
        let mut series = BTreeMap::new();

        for &year in available.iter().take(years) {
            let facts = self.extract_year(year);
            if policy::has_core_coverage(&facts) {
                info!(year, fields = facts.len(), "year included in time series");
                series.insert(year, facts);
            } else {
                warn!(year, fields = facts.len(), "year skipped: core fields incomplete");
            }
        }
        series
    }

    /// Percentage gap of `Assets = Liabilities + Equity` over an extracted
    /// fact map, when all three figures are present.
    #[must_use]
    pub fn balance_identity_gap(facts: &BTreeMap<String, SourceTrace>) -> Option<f64> {
        match (
            facts.get("Assets"),
            facts.get("Liabilities"),
            facts.get("Equity"),
        ) {
            (Some(assets), Some(liabilities), Some(equity)) => Some(policy::identity_gap_pct(
                assets.raw_value,
                liabilities.raw_value,
                equity.raw_value,
            )),
            _ => None,
        }
    }

    /// The mapping gaps accumulated so far.
    #[must_use]
    pub fn mapping_gaps(&self) -> &[MappingGap] {
        self.fuzzy.gaps()
    }

    /// Human-readable mapping-gap report for this document.
    #[must_use]
    pub fn mapping_gaps_report(&self) -> String {
        self.fuzzy.gaps_report()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn extract_section_for_year(
        &mut self,
        section: Section,
        year: Option<i32>,
    ) -> BTreeMap<String, SourceTrace> {
        let context_id = match section {
            Section::BalanceSheet => self.resolve_balance_context(year),
            Section::IncomeStatement | Section::CashFlow => {
                match self.contexts.income_context(year) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!(%section, ?year, error = %e, "income context unavailable");
                        None
                    }
                }
            }
        };
        let Some(context_id) = context_id else {
            return BTreeMap::new();
        };

        let concepts: Vec<String> = self
            .resolver
            .taxonomy()
            .section_concepts(section)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut facts = BTreeMap::new();
        for concept in concepts {
            if let Some(trace) = self.extract_concept(&concept, &context_id, section) {
                facts.insert(concept, trace);
            }
        }
        debug!(%section, context = %context_id, extracted = facts.len(), "section extracted");
        facts
    }

    /// Resolves the balance-sheet context, disambiguating restated filings
    /// where several consolidated instant contexts share the target date.
    fn resolve_balance_context(&self, year: Option<i32>) -> Option<String> {
        let candidates = match self.contexts.balance_context_candidates(year) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(?year, error = %e, "balance context unavailable");
                return None;
            }
        };

        match candidates.len() {
            0 => {
                warn!(?year, "no consolidated instant context on the target date");
                None
            }
            1 => Some(candidates.into_iter().next().unwrap_or_default()),
            _ => {
                let probes: Vec<policy::ContextProbe> = candidates
                    .iter()
                    .map(|id| self.probe_identity(id))
                    .collect();
                let winner = policy::pick_balance_context(&probes)?;
                info!(
                    candidates = candidates.len(),
                    chosen = %candidates[winner],
                    "ambiguous balance context disambiguated against the accounting identity"
                );
                candidates.into_iter().nth(winner)
            }
        }
    }

    /// Direct (no-fallback) probe of Assets/Liabilities/Equity inside one
    /// candidate context.
    fn probe_identity(&self, context_id: &str) -> policy::ContextProbe {
        let probe = |concept: &str| -> Option<f64> {
            let tag = self.resolver.resolve(concept, &self.document).ok()?;
            self.fact_in_context(&tag, context_id, Section::BalanceSheet)
                .map(|t| t.raw_value)
        };
        policy::ContextProbe {
            context_id: context_id.to_string(),
            assets: probe("Assets"),
            liabilities: probe("Liabilities"),
            equity: probe("Equity"),
        }
    }

    /// Per-concept fallback hierarchy: direct resolution, fuzzy match,
    /// schema parent discovery, then a recorded mapping gap.
    fn extract_concept(
        &mut self,
        concept: &str,
        context_id: &str,
        section: Section,
    ) -> Option<SourceTrace> {
        // Step 1: direct taxonomy lookup.
        if let Ok(tag) = self.resolver.resolve(concept, &self.document)
            && let Some(trace) = self.fact_in_context(&tag, context_id, section)
        {
            return Some(trace);
        }

        let aliases = match self.resolver.concept_info(concept) {
            Ok(info) => info.candidate_tags(),
            Err(_) => Vec::new(),
        };
        let available = self.document.numeric_fact_tags();

        // Step 2: fuzzy match against the document's own tag universe.
        if !aliases.is_empty()
            && let Some(matched) = self.fuzzy.fuzzy_match_alias(concept, &available, &aliases)
        {
            let local = matched.tag.rsplit(':').next().unwrap_or(&matched.tag);
            if let Some(trace) = self.fact_in_context(local, context_id, section) {
                debug!(concept, tag = %matched.tag, score = matched.score, "fuzzy fallback hit");
                return Some(trace);
            }
        }

        // Step 3: schema hierarchy — a document tag whose substitution
        // ancestor is one of our aliases.
        if let Some(schema) = &self.schema {
            for tag in &available {
                if let Some(parent) = self.fuzzy.find_parent_tag(tag, schema)
                    && aliases.contains(&parent)
                {
                    let local = tag.rsplit(':').next().unwrap_or(tag);
                    if let Some(trace) = self.fact_in_context(local, context_id, section) {
                        debug!(concept, tag = %tag, parent = %parent, "parent-tag fallback hit");
                        return Some(trace);
                    }
                }
            }
        }

        // Step 4: give up and leave an audit trail.
        let note = format!(
            "{} - {}",
            self.document.entity_identifier().unwrap_or("unknown entity"),
            section
        );
        self.fuzzy
            .record_mapping_gap(concept, aliases, &available, note);
        None
    }

    /// Extracts the fact for one tag inside one context, applying the
    /// duplicate tie-break when the filer tagged the value more than once.
    fn fact_in_context(
        &self,
        local_tag: &str,
        context_id: &str,
        section: Section,
    ) -> Option<SourceTrace> {
        let candidates: Vec<(&crate::document::RawFact, f64)> = self
            .document
            .facts_with_tag(local_tag)
            .filter(|f| f.context_ref == context_id)
            .filter_map(|f| f.numeric_value().map(|v| (f, v)))
            .collect();

        if candidates.len() > 1 {
            debug!(
                tag = local_tag,
                context = context_id,
                duplicates = candidates.len(),
                "duplicate facts in one context; taking largest magnitude"
            );
        }

        let values: Vec<f64> = candidates.iter().map(|(_, v)| *v).collect();
        let winner = policy::pick_duplicate_fact(&values)?;
        let (fact, value) = &candidates[winner];
        Some(SourceTrace::new(
            fact.qualified_name(),
            *value,
            context_id,
            section,
        ))
    }

    fn log_identity_check(&self, facts: &BTreeMap<String, SourceTrace>) {
        if let Some(gap) = Self::balance_identity_gap(facts) {
            if gap <= policy::IDENTITY_TOLERANCE_PCT {
                info!(gap_pct = gap, "balance sheet identity holds");
            } else {
                warn!(gap_pct = gap, "balance sheet identity violated");
            }
        }
    }
}

/// First `.xsd` file next to the instance document, if it parses.
fn discover_sibling_schema(path: &Path) -> Option<XbrlSchema> {
    let dir = path.parent()?;
    let mut xsd_paths: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "xsd"))
        .collect();
    xsd_paths.sort();

    let xsd = xsd_paths.into_iter().next()?;
    match XbrlSchema::load(&xsd) {
        Ok(schema) => {
            debug!(path = %xsd.display(), elements = schema.len(), "companion schema loaded");
            Some(schema)
        }
        Err(e) => {
            debug!(path = %xsd.display(), error = %e, "companion schema unusable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::FilingError;

    fn taxonomy() -> Arc<Taxonomy> {
        Arc::new(Taxonomy::standard())
    }

    const HEADER: &str = r#"<xbrl xmlns="http://www.xbrl.org/2003/instance"
      xmlns:us-gaap="http://fasb.org/us-gaap/2024"
      xmlns:dei="http://xbrl.sec.gov/dei/2024"
      xmlns:aapl="http://www.apple.com/20240928""#;

    /// A small but structurally honest 10-K: a filing-date cover context,
    /// the fiscal year-end instant, the annual duration, and a segmented
    /// duplicate. Assets = Liabilities + Equity exactly.
    fn annual_fixture() -> String {
        format!(
            r#"{HEADER}
      xmlns:xbrldi="http://xbrl.org/2006/xbrldi">
  <context id="c-filing">
    <entity><identifier scheme="http://www.sec.gov/CIK">0000320193</identifier></entity>
    <period><instant>2024-11-01</instant></period>
  </context>
  <context id="c-20">
    <entity><identifier scheme="http://www.sec.gov/CIK">0000320193</identifier></entity>
    <period><instant>2024-09-28</instant></period>
  </context>
  <context id="c-1">
    <entity><identifier scheme="http://www.sec.gov/CIK">0000320193</identifier></entity>
    <period><startDate>2023-10-01</startDate><endDate>2024-09-28</endDate></period>
  </context>
  <context id="c-seg">
    <entity>
      <identifier scheme="http://www.sec.gov/CIK">0000320193</identifier>
      <segment><xbrldi:explicitMember dimension="us-gaap:StatementBusinessSegmentsAxis">aapl:AmericasSegmentMember</xbrldi:explicitMember></segment>
    </entity>
    <period><instant>2024-09-28</instant></period>
  </context>
  <unit id="usd"><measure>iso4217:USD</measure></unit>
  <dei:EntityCommonStockSharesOutstanding contextRef="c-filing" decimals="-3">15115823000</dei:EntityCommonStockSharesOutstanding>
  <us-gaap:Assets contextRef="c-20" unitRef="usd" decimals="-6">364980000000</us-gaap:Assets>
  <us-gaap:Assets contextRef="c-seg" unitRef="usd" decimals="-6">167045000000</us-gaap:Assets>
  <us-gaap:Liabilities contextRef="c-20" unitRef="usd" decimals="-6">308030000000</us-gaap:Liabilities>
  <us-gaap:StockholdersEquity contextRef="c-20" unitRef="usd" decimals="-6">56950000000</us-gaap:StockholdersEquity>
  <us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax contextRef="c-1" unitRef="usd" decimals="-6">391035000000</us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax>
  <us-gaap:NetIncomeLoss contextRef="c-1" unitRef="usd" decimals="-6">93736000000</us-gaap:NetIncomeLoss>
  <us-gaap:NetCashProvidedByUsedInOperatingActivities contextRef="c-1" unitRef="usd" decimals="-6">118254000000</us-gaap:NetCashProvidedByUsedInOperatingActivities>
  <us-gaap:PaymentsToAcquirePropertyPlantAndEquipment contextRef="c-1" unitRef="usd" decimals="-6">9447000000</us-gaap:PaymentsToAcquirePropertyPlantAndEquipment>
</xbrl>"#
        )
    }

    #[test]
    fn test_extract_all_sections() {
        let mut parser = XbrlParser::from_xml(&annual_fixture(), taxonomy()).unwrap();
        assert_eq!(parser.fiscal_year().unwrap(), 2024);

        let facts = parser.extract_all();

        let assets = facts.balance_sheet.get("Assets").unwrap();
        assert_eq!(assets.raw_value, 364_980_000_000.0);
        assert_eq!(assets.xbrl_tag, "us-gaap:Assets");
        assert_eq!(assets.context_id, "c-20");
        assert_eq!(assets.section, Section::BalanceSheet);

        let revenue = facts.income_statement.get("Revenue").unwrap();
        assert_eq!(revenue.raw_value, 391_035_000_000.0);
        assert_eq!(revenue.context_id, "c-1");

        assert!(facts.cash_flow.contains_key("OperatingCashFlow"));
        assert!(facts.cash_flow.contains_key("CapitalExpenditures"));

        // Flatten keeps every concept reachable by name.
        let flat = facts.flatten();
        assert_eq!(flat.len(), facts.len());
        assert!(flat.contains_key("NetIncome"));
    }

    #[test]
    fn test_balance_identity_round_trip() {
        let mut parser = XbrlParser::from_xml(&annual_fixture(), taxonomy()).unwrap();
        let balance = parser.extract_balance_sheet();

        let gap = XbrlParser::balance_identity_gap(&balance).unwrap();
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn test_segmented_duplicate_not_picked() {
        // The segmented Assets figure lives in its own context, so the
        // consolidated context's value must win untouched.
        let mut parser = XbrlParser::from_xml(&annual_fixture(), taxonomy()).unwrap();
        let balance = parser.extract_balance_sheet();
        assert_eq!(balance["Assets"].raw_value, 364_980_000_000.0);
    }

    #[test]
    fn test_duplicate_in_one_context_takes_largest_magnitude() {
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-20"><period><instant>2024-09-28</instant></period></context>
  <us-gaap:Assets contextRef="c-20">1000000</us-gaap:Assets>
  <us-gaap:Assets contextRef="c-20">364980000000</us-gaap:Assets>
</xbrl>"#
        );
        let mut parser = XbrlParser::from_xml(&xml, taxonomy()).unwrap();
        let balance = parser.extract_balance_sheet();
        assert_eq!(balance["Assets"].raw_value, 364_980_000_000.0);
    }

    #[test]
    fn test_fuzzy_fallback_on_extension_tag() {
        // No standard Revenue tag; the filer's aapl:RevenuesNet is close
        // enough to the "Revenues" alias to clear the default threshold.
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-20"><period><instant>2024-09-28</instant></period></context>
  <context id="c-1"><period><startDate>2023-10-01</startDate><endDate>2024-09-28</endDate></period></context>
  <aapl:RevenuesNet contextRef="c-1">391035000000</aapl:RevenuesNet>
</xbrl>"#
        );
        let mut parser = XbrlParser::from_xml(&xml, taxonomy()).unwrap();
        let income = parser.extract_income_statement();

        let revenue = income.get("Revenue").unwrap();
        assert_eq!(revenue.xbrl_tag, "aapl:RevenuesNet");
        assert_eq!(revenue.raw_value, 391_035_000_000.0);
    }

    #[test]
    fn test_parent_tag_fallback_via_schema() {
        // aapl:NetSalesTotal is too far from every alias for fuzzy
        // matching, but its schema anchors it under us-gaap:Revenues.
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-20"><period><instant>2024-09-28</instant></period></context>
  <context id="c-1"><period><startDate>2023-10-01</startDate><endDate>2024-09-28</endDate></period></context>
  <aapl:NetSalesTotal contextRef="c-1">391035000000</aapl:NetSalesTotal>
</xbrl>"#
        );
        let schema = XbrlSchema::parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:us-gaap="http://fasb.org/us-gaap/2024">
                 <xs:element name="NetSalesTotal" substitutionGroup="us-gaap:Revenues"/>
               </xs:schema>"#,
        )
        .unwrap();
        let mut parser = XbrlParser::from_xml(&xml, taxonomy())
            .unwrap()
            .with_schema(schema);

        let income = parser.extract_income_statement();
        let revenue = income.get("Revenue").unwrap();
        assert_eq!(revenue.xbrl_tag, "aapl:NetSalesTotal");
    }

    #[test]
    fn test_unmapped_concept_records_gap() {
        let mut parser = XbrlParser::from_xml(&annual_fixture(), taxonomy()).unwrap();
        let balance = parser.extract_balance_sheet();

        assert!(!balance.contains_key("Goodwill"));
        assert!(parser.mapping_gaps().iter().any(|g| g.concept == "Goodwill"));
        let report = parser.mapping_gaps_report();
        assert!(report.contains("ACTION REQUIRED"));
    }

    #[test]
    fn test_missing_income_context_is_graceful() {
        // No annual duration context: income and cash flow come back
        // empty, the balance sheet still extracts.
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-20"><period><instant>2024-09-28</instant></period></context>
  <us-gaap:Assets contextRef="c-20">364980000000</us-gaap:Assets>
</xbrl>"#
        );
        let mut parser = XbrlParser::from_xml(&xml, taxonomy()).unwrap();
        let facts = parser.extract_all();

        assert!(facts.balance_sheet.contains_key("Assets"));
        assert!(facts.income_statement.is_empty());
        assert!(facts.cash_flow.is_empty());
    }

    #[test]
    fn test_ambiguous_balance_context_self_validation() {
        // Two consolidated instant contexts share the year-end date; only
        // c-good satisfies Assets = Liabilities + Equity.
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-stale"><period><instant>2024-09-28</instant></period></context>
  <context id="c-good"><period><instant>2024-09-28</instant></period></context>
  <us-gaap:Assets contextRef="c-stale">500000000</us-gaap:Assets>
  <us-gaap:Liabilities contextRef="c-stale">100000000</us-gaap:Liabilities>
  <us-gaap:StockholdersEquity contextRef="c-stale">100000000</us-gaap:StockholdersEquity>
  <us-gaap:Assets contextRef="c-good">364980000000</us-gaap:Assets>
  <us-gaap:Liabilities contextRef="c-good">308030000000</us-gaap:Liabilities>
  <us-gaap:StockholdersEquity contextRef="c-good">56950000000</us-gaap:StockholdersEquity>
</xbrl>"#
        );
        let mut parser = XbrlParser::from_xml(&xml, taxonomy()).unwrap();
        let balance = parser.extract_balance_sheet();

        assert_eq!(balance["Assets"].context_id, "c-good");
        assert_eq!(balance["Assets"].raw_value, 364_980_000_000.0);
    }

    #[test]
    fn test_single_document_timeseries() {
        // Two comparative years in one filing; 2023 has three core fields
        // (no Equity) and is still included by the relaxed rule.
        let xml = format!(
            r#"{HEADER}>
  <context id="c-filing"><period><instant>2024-11-01</instant></period></context>
  <context id="c-24"><period><instant>2024-09-28</instant></period></context>
  <context id="c-23"><period><instant>2023-09-30</instant></period></context>
  <context id="d-24"><period><startDate>2023-10-01</startDate><endDate>2024-09-28</endDate></period></context>
  <context id="d-23"><period><startDate>2022-10-02</startDate><endDate>2023-09-30</endDate></period></context>
  <us-gaap:Assets contextRef="c-24">364980000000</us-gaap:Assets>
  <us-gaap:Liabilities contextRef="c-24">308030000000</us-gaap:Liabilities>
  <us-gaap:StockholdersEquity contextRef="c-24">56950000000</us-gaap:StockholdersEquity>
  <us-gaap:Assets contextRef="c-23">352583000000</us-gaap:Assets>
  <us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax contextRef="d-24">391035000000</us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax>
  <us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax contextRef="d-23">383285000000</us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax>
  <us-gaap:NetIncomeLoss contextRef="d-24">93736000000</us-gaap:NetIncomeLoss>
  <us-gaap:NetIncomeLoss contextRef="d-23">96995000000</us-gaap:NetIncomeLoss>
</xbrl>"#
        );
        let mut parser = XbrlParser::from_xml(&xml, taxonomy()).unwrap();
        assert_eq!(parser.available_years(), vec![2024, 2023]);

        let series = parser.extract_timeseries(5);
        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        assert_eq!(series[&2023]["NetIncome"].raw_value, 96_995_000_000.0);
        assert!(!series[&2023].contains_key("Equity"));
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let err = XbrlParser::load("/nonexistent/filing.xml", taxonomy()).unwrap_err();
        assert!(matches!(err, FilingError::FileLoad { .. }));
    }
}
