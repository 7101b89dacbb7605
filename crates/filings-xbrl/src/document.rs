//! Owned model of one XBRL instance document.
//!
//! The instance XML is walked exactly once; everything the engine needs
//! afterwards (contexts, facts, the tag universe) is captured into owned
//! data so no borrow of the XML buffer escapes this module.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use tracing::debug;

use filings_core::{FilingError, Period, Result, XbrlContext};

/// Monotonic id source so resolver memoization can be keyed by document.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Element names that are structure, not facts.
const NON_FACT_ELEMENTS: [&str; 4] = ["context", "unit", "xbrl", "schemaRef"];

/// Name fragments of metadata elements that carry a `contextRef` but are
/// never numeric facts (presentation axes, disclosure text blocks, ...).
const METADATA_NAME_MARKERS: [&str; 7] = [
    "Axis",
    "Member",
    "Domain",
    "Table",
    "LineItems",
    "Abstract",
    "TextBlock",
];

/// One fact element as it appears in the instance document.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFact {
    /// Tag name without namespace (e.g. `NetIncomeLoss`).
    pub local_name: String,
    /// Namespace prefix (e.g. `us-gaap`, or a filer extension like `aapl`).
    pub prefix: String,
    /// The `contextRef` attribute.
    pub context_ref: String,
    /// The `unitRef` attribute, if any.
    pub unit_ref: Option<String>,
    /// The `decimals` attribute, if any. Deliberately not applied to the
    /// value; magnitudes are compared in reported units.
    pub decimals: Option<String>,
    /// Raw text content.
    pub value: String,
}

impl RawFact {
    /// `prefix:Local` when a prefix is present, the local name otherwise.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.prefix.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}:{}", self.prefix, self.local_name)
        }
    }

    /// The fact value parsed as a number, if it is one.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok()
    }

    /// Whether the element name marks presentation metadata rather than a
    /// reportable fact.
    fn is_metadata(&self) -> bool {
        METADATA_NAME_MARKERS
            .iter()
            .any(|marker| self.local_name.contains(marker))
    }
}

/// Parsed, owned representation of one XBRL instance document.
#[derive(Debug)]
pub struct XbrlDocument {
    id: u64,
    entity: Option<String>,
    contexts: Vec<XbrlContext>,
    facts: Vec<RawFact>,
    tag_names: HashSet<String>,
}

impl XbrlDocument {
    /// Reads and parses an instance document from disk.
    ///
    /// An unreadable file or malformed XML is fatal for this document (and
    /// only this document).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| FilingError::FileLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse_str(&xml).map_err(|e| FilingError::FileLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parses an instance document from an XML string.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let tree = roxmltree::Document::parse(xml).map_err(|e| FilingError::Xml(e.to_string()))?;

        let mut contexts = Vec::new();
        let mut facts = Vec::new();
        let mut tag_names = HashSet::new();
        let mut entity = None;

        for node in tree.root_element().descendants() {
            if node.node_type() != roxmltree::NodeType::Element {
                continue;
            }
            let name = node.tag_name().name();

            if name == "context" {
                if entity.is_none() {
                    entity = find_entity_identifier(&node);
                }
                match parse_context(&node) {
                    Some(context) => contexts.push(context),
                    None => debug!(
                        context_id = node.attribute("id").unwrap_or(""),
                        "skipping context without a parseable period"
                    ),
                }
                continue;
            }

            // Facts are the elements that reference a context.
            let Some(context_ref) = node.attribute("contextRef") else {
                continue;
            };
            if NON_FACT_ELEMENTS.contains(&name) {
                continue;
            }

            let namespace = node.tag_name().namespace().unwrap_or("");
            let prefix = node.lookup_prefix(namespace).unwrap_or("");

            let fact = RawFact {
                local_name: name.to_string(),
                prefix: prefix.to_string(),
                context_ref: context_ref.to_string(),
                unit_ref: node.attribute("unitRef").map(str::to_string),
                decimals: node.attribute("decimals").map(str::to_string),
                value: node.text().unwrap_or("").trim().to_string(),
            };
            tag_names.insert(fact.local_name.clone());
            facts.push(fact);
        }

        debug!(
            contexts = contexts.len(),
            facts = facts.len(),
            "parsed XBRL instance"
        );

        Ok(Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            entity,
            contexts,
            facts,
            tag_names,
        })
    }

    /// Process-unique id of this parse, used to key per-document caches.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The entity identifier from the first context, if present.
    #[must_use]
    pub fn entity_identifier(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Every reporting context in document order.
    #[must_use]
    pub fn contexts(&self) -> &[XbrlContext] {
        &self.contexts
    }

    /// Every fact element in document order.
    #[must_use]
    pub fn facts(&self) -> &[RawFact] {
        &self.facts
    }

    /// Whether any fact in the document uses the given local tag name,
    /// in any context.
    #[must_use]
    pub fn has_tag(&self, local_name: &str) -> bool {
        self.tag_names.contains(local_name)
    }

    /// Facts bearing the given local tag name, in document order.
    pub fn facts_with_tag<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a RawFact> {
        self.facts.iter().filter(move |f| f.local_name == local_name)
    }

    /// Distinct qualified names of numeric facts, in first-seen order.
    ///
    /// This is the universe fuzzy matching runs against; presentation
    /// metadata (axes, members, text blocks) is excluded.
    #[must_use]
    pub fn numeric_fact_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tags = Vec::new();
        for fact in &self.facts {
            if fact.numeric_value().is_none() || fact.is_metadata() {
                continue;
            }
            let qualified = fact.qualified_name();
            if seen.insert(qualified.clone()) {
                tags.push(qualified);
            }
        }
        tags
    }
}

/// Extracts the period and segment shape of one `<context>` element.
fn parse_context(node: &roxmltree::Node<'_, '_>) -> Option<XbrlContext> {
    let id = node.attribute("id")?.to_string();
    let has_segment = node
        .descendants()
        .any(|n| n.tag_name().name() == "segment");

    let mut instant = None;
    let mut start = None;
    let mut end = None;
    for child in node.descendants() {
        match child.tag_name().name() {
            "instant" => instant = parse_date(child.text()),
            "startDate" => start = parse_date(child.text()),
            "endDate" => end = parse_date(child.text()),
            _ => {}
        }
    }

    let period = match (instant, start, end) {
        (Some(date), _, _) => Period::Instant(date),
        (None, Some(start), Some(end)) => Period::Duration { start, end },
        _ => return None,
    };

    Some(XbrlContext {
        id,
        period,
        has_segment,
    })
}

fn find_entity_identifier(context: &roxmltree::Node<'_, '_>) -> Option<String> {
    context
        .descendants()
        .find(|n| n.tag_name().name() == "identifier")
        .and_then(|n| n.text())
        .map(|text| text.trim().to_string())
}

fn parse_date(text: Option<&str>) -> Option<NaiveDate> {
    // Period elements occasionally carry a full timestamp; the date part
    // is always the leading ten characters.
    let text = text?.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
