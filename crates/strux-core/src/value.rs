//! # Dynamic Field Values
//!
//! Every record field holds a [`Value`]: a tagged union over primitives,
//! ordered sequences, ordered mappings and nested records. Construction
//! assigns values without looking at their variant; only the validation
//! pass cares what a field actually contains.
//!
//! The `Display` impl renders the export representation used in violation
//! lines, e.g. `'abc'`, `42`, `null`, `[1, 2]`, `Address { city: 'Oslo' }`.

use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::map::FieldMap;
use crate::structure::Structure;

/// Discriminant of a [`Value`], used by type constraints and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Struct,
}

impl ValueKind {
    /// Lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Struct => "struct",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dynamically-typed field value.
///
/// `Struct` values compare equal when both records have the same type name
/// and pairwise-equal fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(FieldMap),
    Struct(Box<dyn Structure>),
}

impl Value {
    /// Wrap a record as a nested value.
    pub fn structure(record: impl Structure) -> Self {
        Self::Struct(Box::new(record))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Struct(_) => ValueKind::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&dyn Structure> {
        match self {
            Self::Struct(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Downcast a nested record to its concrete type.
    pub fn downcast_ref<T: Structure>(&self) -> Option<&T> {
        self.as_struct()
            .and_then(|record| record.as_any().downcast_ref::<T>())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<FieldMap> for Value {
    fn from(map: FieldMap) -> Self {
        Self::Map(map)
    }
}

impl From<Box<dyn Structure>> for Value {
    fn from(record: Box<dyn Structure>) -> Self {
        Self::Struct(record)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_nan() => f.write_str("NAN"),
            Self::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "INF" } else { "-INF" })
            }
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write_quoted(f, s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, " => {value}")?;
                }
                f.write_str("}")
            }
            Self::Struct(record) => {
                write!(f, "{} {{", record.type_name())?;
                for (i, (name, value)) in record.fields().into_iter().enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    write!(f, "{name}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Self::Struct(record) => record.as_ref().serialize(serializer),
        }
    }
}

/// Values deserialize through the JSON data model; nested objects become
/// [`Value::Map`], never records.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(crate::json::value_from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(3).kind(), ValueKind::Int);
        assert_eq!(Value::from(3.5).kind(), ValueKind::Float);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::from(vec![1, 2]).kind(), ValueKind::List);
        assert_eq!(Value::from(FieldMap::new()).kind(), ValueKind::Map);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn test_as_f64_widens_integers() {
        assert_eq!(Value::from(7).as_f64(), Some(7.0));
        assert_eq!(Value::from("7").as_f64(), None);
    }

    #[test]
    fn test_export_scalars() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-4).to_string(), "-4");
        assert_eq!(Value::from(1.0).to_string(), "1.0");
        assert_eq!(Value::from(f64::NAN).to_string(), "NAN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-INF");
    }

    #[test]
    fn test_export_escapes_quotes() {
        assert_eq!(Value::from(r"it's a \ path").to_string(), r"'it\'s a \\ path'");
    }

    #[test]
    fn test_export_collections() {
        let list = Value::from(vec![Value::from(1), Value::from("b"), Value::Null]);
        assert_eq!(list.to_string(), "[1, 'b', null]");

        let map: FieldMap = [("k", Value::from(2))].into_iter().collect();
        assert_eq!(Value::from(map).to_string(), "{'k' => 2}");
    }

    #[test]
    fn test_serialize_to_json() {
        let list = Value::from(vec![Value::from(1), Value::from("b"), Value::Null]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"[1,"b",null]"#);
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, 2.5, "x"], "b": null}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(
            map.get("a"),
            Some(&Value::from(vec![
                Value::from(1),
                Value::from(2.5),
                Value::from("x")
            ]))
        );
        assert_eq!(map.get("b"), Some(&Value::Null));
    }
}
