#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filings-rs/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Structured financial fact extraction from SEC XBRL filings.
//!
//! For a filer and fiscal year, the engine deterministically recovers one
//! value per financial concept with full provenance (tag, context,
//! section), degrading gracefully when a filer uses non-standard tags.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use filings::{MultiFileXbrlParser, Taxonomy};
//!
//! fn main() -> filings::Result<()> {
//!     let taxonomy = Arc::new(Taxonomy::standard());
//!     let mut parser = MultiFileXbrlParser::new("AAPL", "data", taxonomy)?;
//!
//!     let series = parser.extract_timeseries(4, None);
//!     for (year, facts) in series.iter().rev() {
//!         if let Some(revenue) = facts.get("Revenue") {
//!             println!("{year}: revenue {} via {}", revenue.raw_value, revenue.xbrl_tag);
//!         }
//!     }
//!
//!     let validation = parser.validate_balance_sheets(&series);
//!     println!("{validation:?}");
//!     println!("{}", parser.consolidated_gaps_report());
//!     Ok(())
//! }
//! ```

// Core types and taxonomy
pub use filings_core::*;

// Extraction engine
pub use filings_xbrl::{
    ContextManager, FactSet, FilerPattern, FilerPatterns, FuzzyMapper, FuzzyMatch,
    MultiFileXbrlParser, RawFact, TaxonomyResolver, XbrlDocument, XbrlParser, XbrlSchema,
    YearContexts,
};
