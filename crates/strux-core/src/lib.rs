//! # strux-core — Closed-Field Records
//!
//! This crate defines the record model shared by every `strux` crate: a
//! record type declares a fixed set of fields at compile time, every field
//! holds a dynamic [`Value`], and the only way to reach a field by name is
//! through a guarded accessor that refuses names the type does not declare.
//!
//! ## Key Design Principles
//!
//! 1. **Closed field set.** Direct access to an undeclared field is a compile
//!    error. By-name access ([`Structure::get`], [`Structure::set`]) is checked
//!    against the static field table and fails with [`UndeclaredFieldError`].
//!    No field is ever created at runtime.
//!
//! 2. **Unchecked construction.** [`StructType::from_map`] assigns values by
//!    key with no type checking or coercion. Shape correctness is the job of
//!    the validation pass in `strux-validate`.
//!
//! 3. **Order-preserving projection.** [`Structure::to_map`] yields every
//!    declared field in declaration order, nested records left as-is.
//!    [`json`] expands nested records for wire output.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `strux-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod construct;
pub mod error;
pub mod json;
pub mod map;
mod macros;
pub mod structure;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use construct::UnknownKeys;
pub use error::{Access, JsonError, StructError, UndeclaredFieldError};
pub use map::FieldMap;
pub use structure::{StructType, Structure};
pub use value::{Value, ValueKind};

#[doc(hidden)]
pub use serde as __serde;
