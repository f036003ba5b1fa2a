//! # Error Types
//!
//! - [`ValidationError`] — the aggregated outcome of a failed validation
//!   pass. Its `Display` is the flattened report text.
//! - [`MetadataError`] — failures while declaring or loading constraint
//!   metadata and JSON schemas. These are configuration errors and never
//!   arise from the data being validated.

use thiserror::Error;

use crate::report::ValidationReport;

/// One or more constraint violations somewhere in a record tree.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{report}")]
pub struct ValidationError {
    report: ValidationReport,
}

impl ValidationError {
    pub(crate) fn new(report: ValidationReport) -> Self {
        Self { report }
    }

    /// The structured report behind the flattened text.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_report(self) -> ValidationReport {
        self.report
    }
}

/// Error while declaring or loading constraint metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A metadata or schema file could not be read or parsed.
    #[error("metadata load error for '{origin}': {reason}")]
    Load {
        /// File path or identifier of the metadata source.
        origin: String,
        /// Reason the source could not be loaded.
        reason: String,
    },

    /// Constraints were declared for a field the type does not have.
    #[error("constraints declared for unknown field '{field}' of {type_name}")]
    UnknownField {
        /// Record type the constraints were declared on.
        type_name: String,
        /// The undeclared field name.
        field: String,
    },

    /// A `Regex` constraint pattern does not compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern source.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A JSON schema could not be compiled into a validator.
    #[error("schema build error for '{type_name}': {reason}")]
    SchemaBuild {
        /// Record type the schema belongs to.
        type_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading a metadata directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
