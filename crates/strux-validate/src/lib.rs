//! # strux-validate — Recursive Record Validation
//!
//! Validates `strux-core` records against pluggable per-field constraints
//! and aggregates every violation in a record tree into one error.
//!
//! ## Engine (`engine`)
//!
//! [`Validator::validate`] walks a record depth-first. Each record's own
//! violations become one group headed `Invalid properties in <Type>`;
//! nested records (and records inside lists) are validated after their
//! owner. The flattened text of all groups is the [`ValidationError`]
//! message:
//!
//! ```text
//! Invalid properties in Order
//! reference : This value should not be blank. but got ''
//! Invalid properties in Line
//! quantity : This value should be 1 or more. but got 0
//! ```
//!
//! ## Constraint Sources
//!
//! - [`Constrained`] — constraints declared in code next to the record.
//! - Mapping files — `*.constraints.{yaml,yml,json}` loaded into a
//!   [`MetadataRegistry`].
//! - [`SchemaChecker`] — `<Type>.schema.json` JSON Schemas.
//! - The process-wide registry behind [`Validate::validate`], populated
//!   with [`register`] and [`configure`].
//!
//! Any [`ConstraintChecker`] (including a plain closure) can stand in for
//! these.
//!
//! ## Crate Policy
//!
//! - Depends only on `strux-core` internally.
//! - Checkers report a record's own fields; recursion belongs to the engine.
//! - Loading errors ([`MetadataError`]) are configuration errors and are
//!   never mixed with data violations ([`ValidationError`]).

pub mod checker;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod global;
pub mod metadata;
pub mod report;
pub mod schema;

pub use checker::{CompositeChecker, ConstraintChecker, MetadataChecker};
pub use constraint::{Constraint, Pattern};
pub use engine::{Validator, ValidatorBuilder};
pub use error::{MetadataError, ValidationError};
pub use global::{configure, default_validator, is_registered, register, DefaultChecker, Validate};
pub use metadata::{ClassMetadata, Constrained, MappingFormat, MetadataRegistry};
pub use report::{ValidationReport, Violation, ViolationGroup};
pub use schema::SchemaChecker;
