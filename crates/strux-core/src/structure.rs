//! # Record Traits and the Field Guard
//!
//! [`Structure`] is the object-safe view of a record used wherever records
//! are handled generically: nested values, validation, serialization.
//! [`StructType`] adds the static side (type name, field table, default
//! construction) that only makes sense for a concrete type.
//!
//! ## Field Guard
//!
//! Implementors expose raw lookups ([`Structure::field`],
//! [`Structure::field_mut`]) that return `None` for undeclared names. The
//! provided accessors turn that `None` into an [`UndeclaredFieldError`] so
//! by-name reads and writes can never silently create a field.
//!
//! Records are normally declared with the [`structure!`](crate::structure!)
//! macro, which generates both impls from the field list.

use std::any::Any;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::construct::{self, UnknownKeys};
use crate::error::{Access, UndeclaredFieldError};
use crate::map::FieldMap;
use crate::value::Value;

/// Object-safe interface of a record with a closed field set.
pub trait Structure: fmt::Debug + Send + Sync + 'static {
    /// Name of the record type, used in error messages and metadata lookup.
    fn type_name(&self) -> &'static str;

    /// Declared field names, in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Raw lookup of a declared field. `None` for undeclared names.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Raw mutable lookup of a declared field. `None` for undeclared names.
    fn field_mut(&mut self, name: &str) -> Option<&mut Value>;

    fn clone_boxed(&self) -> Box<dyn Structure>;

    fn as_any(&self) -> &dyn Any;

    /// Guarded read of a field by name.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredFieldError`] if the type does not declare `name`.
    fn get(&self, name: &str) -> Result<&Value, UndeclaredFieldError> {
        let type_name = self.type_name();
        self.field(name)
            .ok_or_else(|| UndeclaredFieldError::new(type_name, name, Access::Get))
    }

    /// Guarded mutable access to a field by name.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredFieldError`] if the type does not declare `name`.
    fn get_mut(&mut self, name: &str) -> Result<&mut Value, UndeclaredFieldError> {
        let type_name = self.type_name();
        self.field_mut(name)
            .ok_or_else(|| UndeclaredFieldError::new(type_name, name, Access::Get))
    }

    /// Guarded write of a field by name. The value is stored as given.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredFieldError`] if the type does not declare `name`;
    /// the record is left untouched.
    fn set(&mut self, name: &str, value: Value) -> Result<(), UndeclaredFieldError> {
        let type_name = self.type_name();
        let slot = self
            .field_mut(name)
            .ok_or_else(|| UndeclaredFieldError::new(type_name, name, Access::Set))?;
        *slot = value;
        Ok(())
    }

    fn declares(&self, name: &str) -> bool {
        self.field_names().contains(&name)
    }

    /// All declared fields paired with their values, in declaration order.
    fn fields(&self) -> Vec<(&'static str, &Value)> {
        self.field_names()
            .iter()
            .filter_map(|name| self.field(name).map(|value| (*name, value)))
            .collect()
    }

    /// Project the record to an ordered mapping of every declared field.
    ///
    /// Nested records are kept as [`Value::Struct`]; expanding them is the
    /// job of whichever serializer consumes the mapping.
    fn to_map(&self) -> FieldMap {
        let mut map = FieldMap::with_capacity(self.field_names().len());
        for (name, value) in self.fields() {
            map.insert(name, value.clone());
        }
        map
    }
}

/// Static side of a record type.
pub trait StructType: Structure + Default + Clone + Sized {
    const TYPE_NAME: &'static str;
    const FIELDS: &'static [&'static str];

    fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }

    /// Build a record from an ordered name→value mapping.
    ///
    /// See [`construct::from_map`] for the exact semantics.
    ///
    /// # Errors
    ///
    /// With [`UnknownKeys::Reject`], the first undeclared key aborts
    /// construction with [`UndeclaredFieldError`].
    fn from_map<I, K, V>(properties: I, mode: UnknownKeys) -> Result<Self, UndeclaredFieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        construct::from_map(properties, mode)
    }

    fn into_value(self) -> Value {
        Value::Struct(Box::new(self))
    }
}

impl Clone for Box<dyn Structure> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl PartialEq for dyn Structure {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self
                .field_names()
                .iter()
                .all(|name| self.field(name) == other.field(name))
    }
}

/// Records serialize as a map of every declared field, nested records
/// expanded recursively.
impl Serialize for dyn Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
