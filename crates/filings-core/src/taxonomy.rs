//! Concept taxonomy configuration.
//!
//! Filers tag the same financial concept under different XBRL names. The
//! [`Taxonomy`] maps canonical concept names (e.g. `"NetIncome"`) to a
//! primary tag plus an ordered list of aliases, grouped by statement
//! section. It is loaded once at startup and shared read-only across
//! document parses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FilingError, Result};
use crate::types::Section;

/// The standard concept inventory, embedded at build time.
const STANDARD_TAXONOMY: &str = include_str!("taxonomy.json");

/// One taxonomy entry: how a canonical concept maps to XBRL tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDefinition {
    /// Statement section the concept belongs to.
    pub section: Section,
    /// The preferred us-gaap tag, tried first.
    pub primary: String,
    /// Alternate tags, tried in declared order after the primary.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ConceptDefinition {
    /// Primary tag followed by aliases — the full probe order.
    #[must_use]
    pub fn candidate_tags(&self) -> Vec<String> {
        let mut tags = Vec::with_capacity(1 + self.aliases.len());
        tags.push(self.primary.clone());
        tags.extend(self.aliases.iter().cloned());
        tags
    }
}

/// Immutable concept → tag mapping shared across documents.
///
/// Construct once with [`Taxonomy::standard`] (or [`Taxonomy::from_json_str`]
/// for a custom map) and pass it to parsers behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Taxonomy {
    concepts: BTreeMap<String, ConceptDefinition>,
}

impl Taxonomy {
    /// Loads the built-in concept inventory (36 concepts: 18 balance sheet,
    /// 13 income statement, 5 cash flow).
    #[must_use]
    pub fn standard() -> Self {
        Self::from_json_str(STANDARD_TAXONOMY).expect("embedded taxonomy map is valid")
    }

    /// Parses a taxonomy map from JSON.
    ///
    /// The expected shape is an object keyed by concept name:
    ///
    /// ```json
    /// { "NetIncome": { "section": "income_statement",
    ///                  "primary": "NetIncomeLoss",
    ///                  "aliases": ["ProfitLoss"],
    ///                  "description": "Net income (loss)" } }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let concepts: BTreeMap<String, ConceptDefinition> =
            serde_json::from_str(json).map_err(|e| FilingError::InvalidTaxonomy(e.to_string()))?;
        Ok(Self { concepts })
    }

    /// Looks up a concept definition.
    #[must_use]
    pub fn get(&self, concept: &str) -> Option<&ConceptDefinition> {
        self.concepts.get(concept)
    }

    /// All concept names, in stable (sorted) order.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.concepts.keys().map(String::as_str)
    }

    /// Concept names belonging to one statement section, in stable order.
    #[must_use]
    pub fn section_concepts(&self, section: Section) -> Vec<&str> {
        self.concepts
            .iter()
            .filter(|(_, def)| def.section == section)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Number of concepts in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}
