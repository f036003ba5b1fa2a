//! # Process-Wide Default Registry
//!
//! `record.validate()` needs constraints without being handed a validator.
//! They come from a single [`MetadataRegistry`] shared by the whole process,
//! created on first use and populated through [`register`] and
//! [`configure`].
//!
//! Registration is idempotent per type: [`register`] returns `Ok(false)`
//! when the type's code-declared constraints are already present.

use std::sync::OnceLock;

use parking_lot::RwLock;
use strux_core::Structure;

use crate::checker::ConstraintChecker;
use crate::engine::Validator;
use crate::error::{MetadataError, ValidationError};
use crate::metadata::{Constrained, MetadataRegistry};
use crate::report::Violation;

fn registry() -> &'static RwLock<MetadataRegistry> {
    static REGISTRY: OnceLock<RwLock<MetadataRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        tracing::debug!("initialized default metadata registry");
        RwLock::new(MetadataRegistry::new())
    })
}

/// Register `T`'s code-declared constraints with the default registry.
///
/// Returns `Ok(false)` if `T` was already registered.
///
/// # Errors
///
/// Returns [`MetadataError::UnknownField`] if `T` declares constraints for
/// a field it does not have.
pub fn register<T: Constrained>() -> Result<bool, MetadataError> {
    registry().write().register::<T>()
}

/// Mutate the default registry, e.g. to load mapping files at startup.
///
/// ```
/// use strux_validate::{configure, ClassMetadata, Constraint};
///
/// configure(|registry| {
///     let mut metadata = ClassMetadata::new("Invoice");
///     metadata.field("number", [Constraint::NotBlank]);
///     registry.insert(metadata);
/// });
/// ```
pub fn configure<R>(f: impl FnOnce(&mut MetadataRegistry) -> R) -> R {
    f(&mut registry().write())
}

/// Returns `true` if the default registry holds metadata for `type_name`.
pub fn is_registered(type_name: &str) -> bool {
    registry().read().contains(type_name)
}

/// Checker evaluating the default registry at check time.
///
/// Constraints registered after a validator was built still apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChecker;

impl ConstraintChecker for DefaultChecker {
    fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        registry().read().check(record)
    }
}

/// A validator over the default registry.
pub fn default_validator() -> Validator {
    Validator::new(DefaultChecker)
}

/// Validation entry points on every record type.
pub trait Validate {
    /// Validate against the default registry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] carrying every violation in the tree.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Validate with an explicit validator.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] carrying every violation in the tree.
    fn validate_with(&self, validator: &Validator) -> Result<(), ValidationError>;
}

impl<T: Structure> Validate for T {
    fn validate(&self) -> Result<(), ValidationError> {
        crate::engine::validate(self, &DefaultChecker)
    }

    fn validate_with(&self, validator: &Validator) -> Result<(), ValidationError> {
        validator.validate(self)
    }
}
