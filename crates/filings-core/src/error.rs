//! Error types for extraction operations.
//!
//! This module defines [`FilingError`] which covers all error cases that can
//! occur when loading, resolving, or extracting facts from XBRL filings.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during filing extraction.
#[derive(Error, Debug)]
pub enum FilingError {
    /// The concept has no entry in the taxonomy map (configuration error).
    #[error("Concept '{0}' not found in taxonomy map")]
    UnknownConcept(String),

    /// Neither the primary tag nor any alias of a concept is present in the
    /// document. Recoverable; callers decide strict vs. tolerant handling.
    #[error("No tag for concept '{concept}' found in XBRL document (tried: {attempted:?})")]
    TagNotInDocument {
        /// The concept that failed to resolve.
        concept: String,
        /// Tags probed, in resolution order (primary first).
        attempted: Vec<String>,
    },

    /// No reporting context matched the requested shape and date.
    #[error("No {wanted} context found for {target}")]
    ContextNotFound {
        /// What was looked for, e.g. "balance (instant)" or "income (annual duration)".
        wanted: String,
        /// The target date or fiscal year that had no matching context.
        target: String,
    },

    /// The document has no consolidated context with an instant date, so the
    /// fiscal period cannot be inferred.
    #[error("No consolidated contexts with an instant date found")]
    FiscalPeriodNotFound,

    /// The file could not be read or parsed as XML. Fatal for that one
    /// document only.
    #[error("Failed to load {path}: {reason}")]
    FileLoad {
        /// Path of the document that failed to load.
        path: PathBuf,
        /// Underlying I/O or XML parse failure.
        reason: String,
    },

    /// A document body passed as a string was not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// No filename pattern is configured for the requested filer.
    /// Aborts multi-file discovery before any file is touched.
    #[error("No filename pattern configured for filer '{0}'")]
    UnknownFiler(String),

    /// The discovery directory does not exist.
    #[error("Data directory does not exist: {0}")]
    DataDir(PathBuf),

    /// No filing documents matched the filer's filename pattern.
    #[error("No XBRL filings found for '{filer}' in {dir}")]
    FilingsNotFound {
        /// The filer whose pattern matched nothing.
        filer: String,
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// The taxonomy configuration could not be parsed.
    #[error("Invalid taxonomy map: {0}")]
    InvalidTaxonomy(String),

    /// A filer filename pattern is not a valid regular expression.
    #[error("Invalid filer pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias using [`FilingError`].
pub type Result<T> = std::result::Result<T, FilingError>;
