//! Canonical concept → document tag resolution.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use filings_core::{ConceptDefinition, FilingError, Result, Taxonomy};

use crate::document::XbrlDocument;

/// Translates canonical concept names into the tag a filer actually used.
///
/// Stateless with respect to documents and reusable across them; the memo
/// map is a pure optimization keyed by document identity, so results from
/// one document can never leak into another.
#[derive(Debug)]
pub struct TaxonomyResolver {
    taxonomy: Arc<Taxonomy>,
    memo: RefCell<HashMap<(u64, String), String>>,
}

impl TaxonomyResolver {
    /// Creates a resolver over a shared taxonomy.
    #[must_use]
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// The taxonomy this resolver consults.
    #[must_use]
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Resolves one concept strictly.
    ///
    /// Probes the primary tag, then each alias in declared order, for
    /// textual presence anywhere in the document (existence only,
    /// regardless of context).
    ///
    /// # Errors
    /// [`FilingError::UnknownConcept`] when the taxonomy has no entry;
    /// [`FilingError::TagNotInDocument`] when no candidate tag appears.
    pub fn resolve(&self, concept: &str, document: &XbrlDocument) -> Result<String> {
        let key = (document.id(), concept.to_string());
        if let Some(hit) = self.memo.borrow().get(&key) {
            return Ok(hit.clone());
        }

        let definition = self
            .taxonomy
            .get(concept)
            .ok_or_else(|| FilingError::UnknownConcept(concept.to_string()))?;

        let attempted = definition.candidate_tags();
        for tag in &attempted {
            if document.has_tag(tag) {
                debug!(concept, tag, "concept resolved");
                self.memo.borrow_mut().insert(key, tag.clone());
                return Ok(tag.clone());
            }
        }

        Err(FilingError::TagNotInDocument {
            concept: concept.to_string(),
            attempted,
        })
    }

    /// Resolves a batch tolerantly: every concept resolves independently
    /// and unresolved concepts map to `None` instead of aborting the batch.
    #[must_use]
    pub fn resolve_all(
        &self,
        concepts: &[&str],
        document: &XbrlDocument,
    ) -> BTreeMap<String, Option<String>> {
        concepts
            .iter()
            .map(|concept| {
                (
                    concept.to_string(),
                    self.resolve(concept, document).ok(),
                )
            })
            .collect()
    }

    /// Metadata accessor for one concept.
    pub fn concept_info(&self, concept: &str) -> Result<&ConceptDefinition> {
        self.taxonomy
            .get(concept)
            .ok_or_else(|| FilingError::UnknownConcept(concept.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml_facts: &str) -> XbrlDocument {
        let xml = format!(
            r#"<xbrl xmlns="http://www.xbrl.org/2003/instance"
                     xmlns:us-gaap="http://fasb.org/us-gaap/2024">
                 <context id="c-1">
                   <period><instant>2024-09-28</instant></period>
                 </context>
                 {xml_facts}
               </xbrl>"#
        );
        XbrlDocument::parse_str(&xml).unwrap()
    }

    fn resolver() -> TaxonomyResolver {
        TaxonomyResolver::new(Arc::new(Taxonomy::standard()))
    }

    #[test]
    fn test_primary_tag_preferred() {
        let doc = doc(r#"<us-gaap:NetIncomeLoss contextRef="c-1">1</us-gaap:NetIncomeLoss>
                        <us-gaap:ProfitLoss contextRef="c-1">2</us-gaap:ProfitLoss>"#);
        assert_eq!(resolver().resolve("NetIncome", &doc).unwrap(), "NetIncomeLoss");
    }

    #[test]
    fn test_alias_fallback_in_declared_order() {
        // Only SalesRevenueNet is present; earlier candidates are skipped.
        let doc = doc(r#"<us-gaap:SalesRevenueNet contextRef="c-1">1000</us-gaap:SalesRevenueNet>"#);
        assert_eq!(resolver().resolve("Revenue", &doc).unwrap(), "SalesRevenueNet");
    }

    #[test]
    fn test_strict_resolution_fails() {
        let doc = doc(r#"<us-gaap:Assets contextRef="c-1">1</us-gaap:Assets>"#);
        let err = resolver().resolve("Revenue", &doc).unwrap_err();
        match err {
            FilingError::TagNotInDocument { concept, attempted } => {
                assert_eq!(concept, "Revenue");
                assert!(attempted.contains(&"Revenues".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_concept() {
        let doc = doc("");
        assert!(matches!(
            resolver().resolve("NonexistentConcept", &doc),
            Err(FilingError::UnknownConcept(_))
        ));
    }

    #[test]
    fn test_resolve_all_is_tolerant() {
        let doc = doc(r#"<us-gaap:Assets contextRef="c-1">1</us-gaap:Assets>"#);
        let resolver = resolver();
        let results = resolver.resolve_all(&["Assets", "Revenue", "NonexistentConcept"], &doc);

        assert_eq!(results.len(), 3);
        assert_eq!(results["Assets"].as_deref(), Some("Assets"));
        assert_eq!(results["Revenue"], None);
        assert_eq!(results["NonexistentConcept"], None);
    }

    #[test]
    fn test_memo_is_per_document() {
        let resolver = resolver();
        let with_primary = doc(r#"<us-gaap:NetIncomeLoss contextRef="c-1">1</us-gaap:NetIncomeLoss>"#);
        let with_alias = doc(r#"<us-gaap:ProfitLoss contextRef="c-1">1</us-gaap:ProfitLoss>"#);

        assert_eq!(
            resolver.resolve("NetIncome", &with_primary).unwrap(),
            "NetIncomeLoss"
        );
        // A different document resolves fresh; the memo cannot poison it.
        assert_eq!(
            resolver.resolve("NetIncome", &with_alias).unwrap(),
            "ProfitLoss"
        );
    }

    #[test]
    fn test_concept_info() {
        let resolver = resolver();
        let info = resolver.concept_info("NetIncome").unwrap();
        assert_eq!(info.primary, "NetIncomeLoss");
        assert!(!info.aliases.is_empty());
        assert!(!info.description.is_empty());

        assert!(matches!(
            resolver.concept_info("Bogus"),
            Err(FilingError::UnknownConcept(_))
        ));
    }
}
