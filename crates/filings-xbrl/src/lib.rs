#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filings-rs/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! XBRL instance parsing and fact extraction.
//!
//! The extraction pipeline, leaves first:
//!
//! - [`XbrlDocument`](document::XbrlDocument) - One-pass owned model of the instance XML
//! - [`ContextManager`](context::ContextManager) - Fiscal-period and context resolution
//! - [`TaxonomyResolver`](resolver::TaxonomyResolver) - Concept → document tag resolution
//! - [`FuzzyMapper`](fuzzy::FuzzyMapper) - Extension-tag fallback and gap auditing
//! - [`XbrlParser`](parser::XbrlParser) - Per-document orchestration
//! - [`MultiFileXbrlParser`](multifile::MultiFileXbrlParser) - Multi-year assembly
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use filings_core::Taxonomy;
//! use filings_xbrl::XbrlParser;
//!
//! fn main() -> filings_core::Result<()> {
//!     let taxonomy = Arc::new(Taxonomy::standard());
//!     let mut parser = XbrlParser::load("data/apple_10k_xbrl.xml", taxonomy)?;
//!
//!     let facts = parser.extract_all();
//!     if let Some(assets) = facts.balance_sheet.get("Assets") {
//!         println!("Assets: {} (from {})", assets.raw_value, assets.xbrl_tag);
//!     }
//!     println!("{}", parser.mapping_gaps_report());
//!     Ok(())
//! }
//! ```

/// Reporting-context resolution.
pub mod context;
/// Owned model of one XBRL instance document.
pub mod document;
/// Fuzzy fallback for filer extension tags.
pub mod fuzzy;
/// Multi-year time-series assembly across per-year filings.
pub mod multifile;
/// Per-document extraction orchestration.
pub mod parser;
/// Named tie-break policies.
pub mod policy;
/// Canonical concept → document tag resolution.
pub mod resolver;
/// Companion XSD schema model.
pub mod schema;

// Re-export commonly used items at crate root
pub use context::{ContextManager, YearContexts};
pub use document::{RawFact, XbrlDocument};
pub use fuzzy::{FuzzyMapper, FuzzyMatch};
pub use multifile::{FilerPattern, FilerPatterns, MultiFileXbrlParser};
pub use parser::{FactSet, XbrlParser};
pub use resolver::TaxonomyResolver;
pub use schema::XbrlSchema;
