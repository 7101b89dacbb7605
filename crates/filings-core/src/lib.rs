#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filings-rs/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for XBRL fact extraction.
//!
//! This crate provides the foundational pieces shared by the extraction
//! engine:
//!
//! - [`SourceTrace`](types::SourceTrace) - An extracted value with provenance
//! - [`XbrlContext`](types::XbrlContext) - One reporting context of a document
//! - [`Taxonomy`](taxonomy::Taxonomy) - Concept → tag configuration
//! - [`FilingError`](error::FilingError) - The error taxonomy

/// Error types for extraction operations.
pub mod error;
/// Concept taxonomy configuration.
pub mod taxonomy;
/// Core data types (SourceTrace, contexts, fiscal periods).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{FilingError, Result};
pub use taxonomy::{ConceptDefinition, Taxonomy};
pub use types::{FiscalPeriod, MappingGap, Period, Section, SourceTrace, XbrlContext};
