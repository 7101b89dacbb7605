//! Fuzzy fallback for filer extension tags.
//!
//! Companies invent custom tags (e.g. `aapl:NetSalesOfiPhone`) that no
//! alias list anticipates. When exact resolution fails, the
//! [`FuzzyMapper`] scores every available tag against the concept's
//! aliases with a normalized similarity ratio, walks the schema's
//! `substitutionGroup` hierarchy for a known ancestor, and records an
//! audit entry for anything that still cannot be mapped.

use std::collections::HashSet;

use tracing::debug;

use filings_core::MappingGap;

use crate::schema::XbrlSchema;

/// How many available tags a gap record keeps as a sample.
const GAP_TAG_SAMPLE: usize = 10;

/// A tag matched by fuzzy comparison, with its similarity score.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyMatch {
    /// The matched document tag, as qualified in the document.
    pub tag: String,
    /// Similarity score in `[0, 1]`.
    pub score: f64,
}

/// Best-effort tag resolution for one document parse.
///
/// One instance per parse; the mapping-gap log is cleared only by
/// constructing a new instance.
#[derive(Debug)]
pub struct FuzzyMapper {
    threshold: f64,
    gaps: Vec<MappingGap>,
}

impl Default for FuzzyMapper {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl FuzzyMapper {
    /// Default minimum similarity for a fuzzy match.
    pub const DEFAULT_THRESHOLD: f64 = 0.75;

    /// Creates a mapper with an explicit similarity threshold in `[0, 1]`.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            gaps: Vec::new(),
        }
    }

    /// The configured similarity threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Finds the best-scoring (tag, alias) pair at or above the threshold.
    ///
    /// Deterministic: given identical inputs the same match is returned,
    /// and ties keep the first-highest pair encountered (tags in given
    /// order, aliases in given order).
    #[must_use]
    pub fn fuzzy_match_alias(
        &self,
        concept: &str,
        available_tags: &[String],
        aliases: &[String],
    ) -> Option<FuzzyMatch> {
        let mut best: Option<FuzzyMatch> = None;

        for tag in available_tags {
            let local = tag.rsplit(':').next().unwrap_or(tag);
            for alias in aliases {
                let score = similarity_ratio(local, alias);
                if score < self.threshold {
                    continue;
                }
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(FuzzyMatch {
                        tag: tag.clone(),
                        score,
                    });
                }
            }
        }

        if let Some(m) = &best {
            debug!(concept, tag = %m.tag, score = m.score, "fuzzy match");
        }
        best
    }

    /// All tags at or above the threshold, best score first.
    ///
    /// Lets a caller apply business validation (e.g. the accounting
    /// identity) to pick among ambiguous candidates instead of trusting
    /// the single best string match.
    #[must_use]
    pub fn fuzzy_match_ranked(
        &self,
        _concept: &str,
        available_tags: &[String],
        aliases: &[String],
    ) -> Vec<FuzzyMatch> {
        let mut candidates: Vec<FuzzyMatch> = available_tags
            .iter()
            .filter_map(|tag| {
                let local = tag.rsplit(':').next().unwrap_or(tag);
                let score = aliases
                    .iter()
                    .map(|alias| similarity_ratio(local, alias))
                    .fold(0.0_f64, f64::max);
                (score >= self.threshold).then(|| FuzzyMatch {
                    tag: tag.clone(),
                    score,
                })
            })
            .collect();
        // Stable: equal scores keep document order.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// Walks the schema's `substitutionGroup` chain upward from a custom
    /// tag until it reaches a tag not itself declared as an extension,
    /// returning that ancestor.
    #[must_use]
    pub fn find_parent_tag(&self, custom_tag: &str, schema: &XbrlSchema) -> Option<String> {
        let mut current = custom_tag.to_string();
        let mut seen = HashSet::new();

        while let Some(parent) = schema.substitution_parent(&current) {
            if !seen.insert(parent.to_string()) {
                // substitutionGroup cycle; bail out.
                return None;
            }
            if !schema.declares(parent) {
                return Some(parent.to_string());
            }
            current = parent.to_string();
        }
        None
    }

    /// Appends an audit record for a concept that could not be mapped.
    /// Never fails.
    pub fn record_mapping_gap(
        &mut self,
        concept: impl Into<String>,
        attempted_aliases: Vec<String>,
        available_tags: &[String],
        note: impl Into<String>,
    ) {
        self.gaps.push(MappingGap {
            concept: concept.into(),
            attempted_aliases,
            available_tags: available_tags.iter().take(GAP_TAG_SAMPLE).cloned().collect(),
            note: note.into(),
        });
    }

    /// The accumulated mapping gaps, in recording order.
    #[must_use]
    pub fn gaps(&self) -> &[MappingGap] {
        &self.gaps
    }

    /// Renders the gap log as a ticket-actionable report.
    #[must_use]
    pub fn gaps_report(&self) -> String {
        if self.gaps.is_empty() {
            return "No mapping gaps detected".to_string();
        }

        let rule = "=".repeat(70);
        let mut report = vec![
            rule.clone(),
            "MAPPING GAPS REPORT - ACTION REQUIRED".to_string(),
            rule.clone(),
            format!("\nTotal gaps detected: {}\n", self.gaps.len()),
        ];

        for (idx, gap) in self.gaps.iter().enumerate() {
            report.push(format!("\n{}. Concept: {}", idx + 1, gap.concept));
            report.push(format!("   Context: {}", gap.note));
            report.push(format!(
                "   Attempted aliases: {}",
                gap.attempted_aliases.join(", ")
            ));
            report.push(format!(
                "   Sample tags available: {}",
                gap.available_tags.join(", ")
            ));
            report.push("   ACTION: Review and add a new alias to the taxonomy map".to_string());
        }

        report.push(format!("\n{rule}"));
        report.join("\n")
    }
}

/// Normalized similarity of two tag names.
///
/// Both sides are lowercased and stripped of non-alphanumerics, then
/// scored as `2 * LCS / (len_a + len_b)` — the ratio is 1.0 for identical
/// names and ~0.67 for `NetSalesOfiPhone` vs `NetSales`.
#[must_use]
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_len(a.as_bytes(), b.as_bytes());
    (2.0 * lcs as f64) / ((a.len() + b.len()) as f64)
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Longest common subsequence length, two-row dynamic program.
fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut prev = vec![0_usize; b.len() + 1];
    let mut curr = vec![0_usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_similarity_ratio_values() {
        assert_eq!(similarity_ratio("Revenues", "Revenues"), 1.0);
        // 2 * 8 / (16 + 8) = 0.666...
        let ratio = similarity_ratio("NetSalesOfiPhone", "NetSales");
        assert!((ratio - 0.6667).abs() < 0.001, "got {ratio}");
        assert!(similarity_ratio("Revenues", "Assets") < 0.5);
        // Normalization ignores case and separators.
        assert_eq!(
            similarity_ratio("Accounts_Receivable-Net", "AccountsReceivableNet"),
            1.0
        );
    }

    #[test]
    fn test_threshold_gates_match() {
        let available = tags(&["aapl:NetSalesOfiPhone", "us-gaap:Assets"]);
        let aliases = tags(&["NetSales"]);

        let loose = FuzzyMapper::new(0.65);
        let m = loose.fuzzy_match_alias("Revenue", &available, &aliases).unwrap();
        assert_eq!(m.tag, "aapl:NetSalesOfiPhone");

        let strict = FuzzyMapper::new(FuzzyMapper::DEFAULT_THRESHOLD);
        assert!(strict.fuzzy_match_alias("Revenue", &available, &aliases).is_none());
    }

    #[test]
    fn test_threshold_monotonic() {
        // Raising the threshold can only remove matches, never add them.
        let available = tags(&[
            "aapl:NetSalesOfiPhone",
            "us-gaap:RevenuesNet",
            "us-gaap:Liabilities",
        ]);
        let aliases = tags(&["NetSales", "Revenues"]);

        let matched_at = |threshold: f64| -> Vec<String> {
            FuzzyMapper::new(threshold)
                .fuzzy_match_ranked("Revenue", &available, &aliases)
                .into_iter()
                .map(|m| m.tag)
                .collect()
        };

        let loose = matched_at(0.6);
        let strict = matched_at(0.8);
        for tag in &strict {
            assert!(loose.contains(tag), "{tag} matched strictly but not loosely");
        }
        assert!(strict.len() <= loose.len());
    }

    #[test]
    fn test_exact_alias_beats_partial() {
        let available = tags(&["us-gaap:Revenues", "aapl:RevenuesOfSegment"]);
        let aliases = tags(&["Revenues"]);
        let mapper = FuzzyMapper::default();

        let ranked = mapper.fuzzy_match_ranked("Revenue", &available, &aliases);
        assert_eq!(ranked[0].tag, "us-gaap:Revenues");
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn test_find_parent_tag_walks_chain() {
        let schema = XbrlSchema::parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:us-gaap="http://fasb.org/us-gaap/2024"
                          xmlns:aapl="http://www.apple.com/20240928">
                 <xs:element name="ServicesNetSales" substitutionGroup="aapl:NetSalesOfiPhone"/>
                 <xs:element name="NetSalesOfiPhone" substitutionGroup="us-gaap:Revenues"/>
               </xs:schema>"#,
        )
        .unwrap();
        let mapper = FuzzyMapper::default();

        // Single step.
        assert_eq!(
            mapper.find_parent_tag("aapl:NetSalesOfiPhone", &schema),
            Some("Revenues".to_string())
        );
        // Two steps: custom tag anchored to another custom tag.
        assert_eq!(
            mapper.find_parent_tag("aapl:ServicesNetSales", &schema),
            Some("Revenues".to_string())
        );
        // Unknown tags have no parent.
        assert_eq!(mapper.find_parent_tag("aapl:Unrelated", &schema), None);
    }

    #[test]
    fn test_gaps_report_empty_and_populated() {
        let mut mapper = FuzzyMapper::default();
        assert_eq!(mapper.gaps_report(), "No mapping gaps detected");

        mapper.record_mapping_gap(
            "Goodwill",
            vec!["Goodwill".to_string()],
            &tags(&["aapl:NetSalesOfiPhone", "us-gaap:Assets"]),
            "0000320193 - balance_sheet",
        );
        let report = mapper.gaps_report();
        assert!(report.contains("MAPPING GAPS REPORT - ACTION REQUIRED"));
        assert!(report.contains("Total gaps detected: 1"));
        assert!(report.contains("Concept: Goodwill"));
        assert!(report.contains("0000320193 - balance_sheet"));
        assert_eq!(mapper.gaps().len(), 1);
    }

    #[test]
    fn test_gap_sample_is_bounded() {
        let mut mapper = FuzzyMapper::default();
        let many: Vec<String> = (0..50).map(|i| format!("us-gaap:Tag{i}")).collect();
        mapper.record_mapping_gap("Assets", vec![], &many, "sample bound");
        assert_eq!(mapper.gaps()[0].available_tags.len(), 10);
    }
}
