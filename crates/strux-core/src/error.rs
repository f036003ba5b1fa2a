//! # Error Types
//!
//! Errors raised by the record model. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Field guard failures carry the record type name, the offending field
//!   name and whether the access was a read or a write.
//! - JSON failures carry the path of the value that could not be encoded.

use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// Top-level error type for record operations.
#[derive(Error, Debug)]
pub enum StructError {
    /// A by-name access named a field the record type does not declare.
    #[error(transparent)]
    UndeclaredField(#[from] UndeclaredFieldError),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] JsonError),
}

/// Direction of a guarded field access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// A read through [`Structure::get`](crate::Structure::get).
    Get,
    /// A write through [`Structure::set`](crate::Structure::set).
    Set,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("get"),
            Self::Set => f.write_str("set"),
        }
    }
}

/// Read or write of a field name not declared by the record type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("non-existent property '{field}' {access} in {type_name}")]
pub struct UndeclaredFieldError {
    /// Name of the record type that rejected the access.
    pub type_name: &'static str,
    /// The field name that was requested.
    pub field: String,
    /// Whether the rejected access was a read or a write.
    pub access: Access,
}

impl UndeclaredFieldError {
    pub fn new(type_name: &'static str, field: impl Into<String>, access: Access) -> Self {
        Self {
            type_name,
            field: field.into(),
            access,
        }
    }
}

/// Error while projecting records to or from JSON.
#[derive(Error, Debug)]
pub enum JsonError {
    /// NaN and infinities have no JSON representation.
    #[error("non-finite float {value} at '{path}' cannot be represented in JSON")]
    NonFiniteFloat {
        /// Dotted path of the offending value.
        path: String,
        /// The rejected float.
        value: f64,
    },

    /// Construction input must be a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// Kind of the value that was supplied instead.
        found: ValueKind,
    },

    /// The input text is not valid JSON.
    #[error("parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}
