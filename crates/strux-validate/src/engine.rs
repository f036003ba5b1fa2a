//! # Recursive Validation Engine
//!
//! Validates a record and everything it owns in a single depth-first walk:
//!
//! 1. Ask the checker for the record's local violations and, if there are
//!    any, emit them as one [`ViolationGroup`].
//! 2. For each declared field in order, recurse into a `Value::Struct`,
//!    into each `Value::Struct` element of a `Value::List` in sequence
//!    order, or into each `Value::Struct` entry of a `Value::Map` in
//!    insertion order. Other values end the walk.
//!
//! A record's own group therefore always precedes the groups of the records
//! nested inside it. The walk never mutates the record, so validating the
//! same record twice yields identical reports.
//!
//! ## Limitations
//!
//! There is no cycle detection and no depth guard. Records own nested
//! records through `Box`, so a cycle cannot be built without interior
//! sharing; stack depth equals nesting depth.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use strux_core::{Structure, Value};

use crate::checker::{CompositeChecker, ConstraintChecker, MetadataChecker};
use crate::error::{MetadataError, ValidationError};
use crate::metadata::MetadataRegistry;
use crate::report::{ValidationReport, ViolationGroup};
use crate::schema::SchemaChecker;

fn child_location(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

fn walk(
    record: &dyn Structure,
    location: &str,
    checker: &dyn ConstraintChecker,
    report: &mut ValidationReport,
) {
    let local = checker.check(record);
    tracing::debug!(
        type_name = record.type_name(),
        location,
        violations = local.len(),
        "validated record"
    );
    if !local.is_empty() {
        report.push(ViolationGroup {
            type_name: record.type_name(),
            location: location.to_string(),
            violations: local,
        });
    }

    for (name, value) in record.fields() {
        match value {
            Value::Struct(nested) => {
                walk(nested.as_ref(), &child_location(location, name), checker, report);
            }
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Struct(nested) = item {
                        let element = format!("{}[{index}]", child_location(location, name));
                        walk(nested.as_ref(), &element, checker, report);
                    }
                }
            }
            Value::Map(entries) => {
                for (key, entry) in entries.iter() {
                    if let Value::Struct(nested) = entry {
                        let element = format!("{}[{key}]", child_location(location, name));
                        walk(nested.as_ref(), &element, checker, report);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Validate `record` and its nested records, returning the full report.
pub fn validate_report(record: &dyn Structure, checker: &dyn ConstraintChecker) -> ValidationReport {
    let mut report = ValidationReport::new();
    walk(record, "", checker, &mut report);
    report
}

/// Validate `record` and its nested records.
///
/// # Errors
///
/// Returns [`ValidationError`] if any record in the tree has a violation.
pub fn validate(
    record: &dyn Structure,
    checker: &dyn ConstraintChecker,
) -> Result<(), ValidationError> {
    let report = validate_report(record, checker);
    if report.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(report))
    }
}

/// A configured validation entry point: a shared constraint checker.
///
/// Cloning is cheap; clones share the checker.
#[derive(Clone)]
pub struct Validator {
    checker: Arc<dyn ConstraintChecker>,
}

impl Validator {
    pub fn new(checker: impl ConstraintChecker + 'static) -> Self {
        Self {
            checker: Arc::new(checker),
        }
    }

    pub fn from_shared(checker: Arc<dyn ConstraintChecker>) -> Self {
        Self { checker }
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    pub fn checker(&self) -> &dyn ConstraintChecker {
        self.checker.as_ref()
    }

    /// Validate `record` and return the full report, empty when valid.
    pub fn report(&self, record: &dyn Structure) -> ValidationReport {
        validate_report(record, self.checker.as_ref())
    }

    /// Validate `record` and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] carrying every violation in the tree.
    pub fn validate(&self, record: &dyn Structure) -> Result<(), ValidationError> {
        validate(record, self.checker.as_ref())
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

/// Assembles a [`Validator`] from metadata and schema sources.
///
/// Metadata from the registry and every metadata directory is merged into
/// one [`MetadataChecker`]. A schema directory adds a [`SchemaChecker`];
/// when both are configured their violations are merged per field.
#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    registry: Option<MetadataRegistry>,
    metadata_dirs: Vec<PathBuf>,
    schema_dir: Option<PathBuf>,
}

impl ValidatorBuilder {
    pub fn with_registry(mut self, registry: MetadataRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Load `*.constraints.{yaml,yml,json}` files from `dir` at build time.
    pub fn with_metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dirs.push(dir.into());
        self
    }

    /// Load `<TypeName>.schema.json` files from `dir` at build time.
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`MetadataError`] if a metadata directory or schema directory
    /// cannot be loaded.
    pub fn build(self) -> Result<Validator, MetadataError> {
        let uses_metadata = self.registry.is_some() || !self.metadata_dirs.is_empty();

        let mut registry = self.registry.unwrap_or_default();
        for dir in &self.metadata_dirs {
            registry.load_dir(dir)?;
        }

        let schema = self.schema_dir.map(SchemaChecker::new).transpose()?;

        let validator = match (uses_metadata, schema) {
            (_, None) => Validator::new(MetadataChecker::new(registry)),
            (false, Some(schema)) => Validator::new(schema),
            (true, Some(schema)) => Validator::new(
                CompositeChecker::new()
                    .with(MetadataChecker::new(registry))
                    .with(schema),
            ),
        };
        Ok(validator)
    }
}
