//! Companion XSD schema model for extension-tag hierarchy traversal.
//!
//! Filers declare custom extension tags in a schema document and anchor
//! them to standard tags via the `substitutionGroup` attribute. The engine
//! only needs that one edge per element, so the schema is reduced to an
//! element-name → parent-tag table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use filings_core::{FilingError, Result};

/// Parsed `substitutionGroup` table of one XSD schema document.
#[derive(Clone, Debug, Default)]
pub struct XbrlSchema {
    substitution_groups: HashMap<String, String>,
}

impl XbrlSchema {
    /// Reads and parses a schema document from disk.
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

    /// Parses a schema document from an XML string.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let tree = roxmltree::Document::parse(xml).map_err(|e| FilingError::Xml(e.to_string()))?;

        let mut substitution_groups = HashMap::new();
        for node in tree.root_element().descendants() {
            if node.tag_name().name() != "element" {
                continue;
            }
            if let (Some(name), Some(group)) =
                (node.attribute("name"), node.attribute("substitutionGroup"))
            {
                substitution_groups.insert(name.to_string(), group.to_string());
            }
        }

        Ok(Self {
            substitution_groups,
        })
    }

    /// The direct `substitutionGroup` parent of an element, namespace prefix
    /// stripped. `None` when the element is not declared in this schema or
    /// declares no parent.
    #[must_use]
    pub fn substitution_parent(&self, element: &str) -> Option<&str> {
        let local = element.rsplit(':').next().unwrap_or(element);
        self.substitution_groups
            .get(local)
            .map(|parent| parent.rsplit(':').next().unwrap_or(parent))
    }

    /// Whether an element is declared in this schema (i.e. it is a filer
    /// extension rather than a standard-taxonomy tag).
    #[must_use]
    pub fn declares(&self, element: &str) -> bool {
        let local = element.rsplit(':').next().unwrap_or(element);
        self.substitution_groups.contains_key(local)
    }

    /// Number of element declarations with a substitution group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.substitution_groups.len()
    }

    /// Whether the schema declares no substitution groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substitution_groups.is_empty()
    }
}
