//! # Constraint Checkers
//!
//! A [`ConstraintChecker`] evaluates the constraints of one record's own
//! fields. It is never expected to recurse: walking nested records is the
//! engine's job, and a checker that recursed would report nested
//! violations twice.
//!
//! Where the constraints come from is up to the checker:
//!
//! - [`MetadataChecker`] — built-in [`Constraint`](crate::Constraint)s from
//!   a [`MetadataRegistry`].
//! - [`SchemaChecker`](crate::SchemaChecker) — per-type JSON Schemas.
//! - [`DefaultChecker`](crate::DefaultChecker) — the process-wide registry.
//! - Any `Fn(&dyn Structure) -> Vec<Violation>` closure.
//! - [`CompositeChecker`] — several of the above, merged.

use strux_core::Structure;

use crate::metadata::MetadataRegistry;
use crate::report::Violation;

/// Evaluates the local constraints of a record.
pub trait ConstraintChecker: Send + Sync {
    /// Violations of `record`'s own fields, in field declaration order.
    fn check(&self, record: &dyn Structure) -> Vec<Violation>;
}

impl<F> ConstraintChecker for F
where
    F: Fn(&dyn Structure) -> Vec<Violation> + Send + Sync,
{
    fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        self(record)
    }
}

/// Checker backed by an owned [`MetadataRegistry`].
#[derive(Debug, Clone, Default)]
pub struct MetadataChecker {
    registry: MetadataRegistry,
}

impl MetadataChecker {
    pub fn new(registry: MetadataRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }
}

impl ConstraintChecker for MetadataChecker {
    fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        self.registry.check(record)
    }
}

/// Runs several checkers and merges their output.
///
/// The merged violations are stably ordered by the declaration position of
/// the field each one names, so output from different checkers interleaves
/// field by field. Record-level violations (empty path) come first.
#[derive(Default)]
pub struct CompositeChecker {
    checkers: Vec<Box<dyn ConstraintChecker>>,
}

impl CompositeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, checker: impl ConstraintChecker + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn push(&mut self, checker: Box<dyn ConstraintChecker>) {
        self.checkers.push(checker);
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

/// Head field of a property path: `lines[2].sku` → `lines`.
pub(crate) fn head_field(path: &str) -> &str {
    let end = path.find(['.', '[']).unwrap_or(path.len());
    &path[..end]
}

/// Sort key placing a violation by the declaration position of its head
/// field: record-level violations first, unknown fields last.
pub(crate) fn field_position(names: &[&str], property_path: &str) -> usize {
    let head = head_field(property_path);
    if head.is_empty() {
        return 0;
    }
    names
        .iter()
        .position(|name| *name == head)
        .map_or(names.len() + 1, |index| index + 1)
}

/// Stable-sort `violations` by [`field_position`].
pub(crate) fn sort_by_field_order(record: &dyn Structure, violations: &mut [Violation]) {
    let names = record.field_names();
    violations.sort_by_key(|v| field_position(names, &v.property_path));
}

impl ConstraintChecker for CompositeChecker {
    fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .checkers
            .iter()
            .flat_map(|checker| checker.check(record))
            .collect();
        sort_by_field_order(record, &mut violations);
        violations
    }
}
