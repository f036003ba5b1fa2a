//! # JSON Projection
//!
//! Converts records and values to and from `serde_json::Value`.
//!
//! ## Encoding
//!
//! [`to_json_value`] walks a record and expands every nested record into a
//! JSON object, the way a generic serializer consumes
//! [`Structure::to_map`](crate::Structure::to_map). Rules:
//!
//! 1. `Null`, `Bool`, `Int`, `String` — pass through unchanged.
//! 2. `Float` — finite values pass through; NaN and infinities are
//!    **rejected** with [`JsonError::NonFiniteFloat`] instead of being
//!    silently written as `null`.
//! 3. `List` / `Map` — elements recursed, map order kept as far as the JSON
//!    object type allows.
//! 4. `Struct` — expanded to an object of its declared fields.
//!
//! ## Decoding
//!
//! [`value_from_json`] never produces records: JSON objects become
//! [`Value::Map`]. Integers that fit in `i64` become [`Value::Int`], every
//! other number becomes [`Value::Float`].

use serde_json::Value as Json;

use crate::construct::{self, UnknownKeys};
use crate::error::{JsonError, StructError};
use crate::map::FieldMap;
use crate::structure::{StructType, Structure};
use crate::value::Value;

/// Project a record to JSON, expanding nested records.
///
/// # Errors
///
/// Returns [`JsonError::NonFiniteFloat`] if any reachable float is NaN or
/// infinite.
pub fn to_json_value(record: &dyn Structure) -> Result<Json, JsonError> {
    record_to_json(record, "")
}

/// Project a record to compact JSON text.
///
/// # Errors
///
/// Same as [`to_json_value`].
pub fn to_json_string(record: &dyn Structure) -> Result<String, JsonError> {
    let value = to_json_value(record)?;
    Ok(serde_json::to_string(&value)?)
}

/// Convert a single value to JSON.
///
/// # Errors
///
/// Returns [`JsonError::NonFiniteFloat`] for NaN or infinite floats.
pub fn value_to_json(value: &Value) -> Result<Json, JsonError> {
    convert(value, "")
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn record_to_json(record: &dyn Structure, path: &str) -> Result<Json, JsonError> {
    let mut object = serde_json::Map::new();
    for (name, value) in record.fields() {
        object.insert(name.to_string(), convert(value, &join(path, name))?);
    }
    Ok(Json::Object(object))
}

fn convert(value: &Value, path: &str) -> Result<Json, JsonError> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Int(i) => Ok(Json::from(*i)),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| JsonError::NonFiniteFloat {
                path: path.to_string(),
                value: *f,
            }),
        Value::String(s) => Ok(Json::String(s.clone())),
        Value::List(items) => {
            let converted: Result<Vec<_>, _> = items
                .iter()
                .enumerate()
                .map(|(i, item)| convert(item, &format!("{path}[{i}]")))
                .collect();
            Ok(Json::Array(converted?))
        }
        Value::Map(map) => {
            let mut object = serde_json::Map::new();
            for (key, item) in map.iter() {
                object.insert(key.to_string(), convert(item, &join(path, key))?);
            }
            Ok(Json::Object(object))
        }
        Value::Struct(record) => record_to_json(record.as_ref(), path),
    }
}

/// Convert JSON into a dynamic value. Objects become [`Value::Map`].
pub fn value_from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(value_from_json).collect()),
        Json::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(k, v)| (k, value_from_json(v)))
                .collect(),
        ),
    }
}

/// Convert a JSON object into a construction mapping.
///
/// # Errors
///
/// Returns [`JsonError::NotAnObject`] if `json` is not an object.
pub fn map_from_json(json: Json) -> Result<FieldMap, JsonError> {
    match value_from_json(json) {
        Value::Map(map) => Ok(map),
        other => Err(JsonError::NotAnObject {
            found: other.kind(),
        }),
    }
}

/// Parse JSON text and build a `T` from its top-level object.
///
/// Nested objects are assigned as [`Value::Map`]; nothing is coerced.
///
/// # Errors
///
/// Returns [`StructError::Json`] for malformed input or a non-object
/// document, and [`StructError::UndeclaredField`] for an unknown key under
/// [`UnknownKeys::Reject`].
pub fn from_json_str<T: StructType>(text: &str, mode: UnknownKeys) -> Result<T, StructError> {
    let json: Json = serde_json::from_str(text).map_err(JsonError::from)?;
    let map = map_from_json(json)?;
    Ok(construct::from_map(map, mode)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::structure! {
        struct Tag {
            pub label,
        }
    }

    crate::structure! {
        struct Post {
            pub title,
            pub score,
            pub tags,
            pub author,
        }
    }

    fn sample() -> Post {
        Post {
            title: Value::from("hello"),
            score: Value::from(4.5),
            tags: Value::from(vec![Tag {
                label: Value::from("rust"),
            }]),
            author: Value::Null,
        }
    }

    #[test]
    fn test_nested_records_expanded() {
        let json = to_json_value(&sample()).unwrap();
        assert_eq!(
            json,
            json!({
                "title": "hello",
                "score": 4.5,
                "tags": [{"label": "rust"}],
                "author": null
            })
        );
    }

    #[test]
    fn test_serialize_impl_matches_projection() {
        let via_serde = serde_json::to_value(sample()).unwrap();
        assert_eq!(via_serde, to_json_value(&sample()).unwrap());
    }

    #[test]
    fn test_non_finite_float_rejected_with_path() {
        let mut post = sample();
        post.tags = Value::from(vec![Value::from(1.0), Value::from(f64::INFINITY)]);
        let err = to_json_value(&post).unwrap_err();
        match err {
            JsonError::NonFiniteFloat { path, .. } => assert_eq!(path, "tags[1]"),
            other => panic!("Expected NonFiniteFloat, got: {other}"),
        }
    }

    #[test]
    fn test_integers_stay_integers() {
        assert_eq!(value_from_json(json!(3)), Value::Int(3));
        assert_eq!(value_from_json(json!(3.0)), Value::Float(3.0));
        assert_eq!(value_from_json(json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn test_map_from_json_requires_object() {
        let err = map_from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            JsonError::NotAnObject {
                found: crate::ValueKind::List
            }
        ));
    }

    #[test]
    fn test_from_json_str_builds_record() {
        let post: Post =
            from_json_str(r#"{"title": "x", "tags": [{"label": "a"}]}"#, UnknownKeys::Reject)
                .unwrap();
        assert_eq!(post.title, Value::from("x"));
        // Nested objects are not turned into records.
        let tags = post.tags.as_list().unwrap();
        assert!(tags[0].as_map().is_some());
    }

    #[test]
    fn test_from_json_str_rejects_unknown_key() {
        let err = from_json_str::<Post>(r#"{"bogus": 1}"#, UnknownKeys::Reject).unwrap_err();
        assert!(matches!(err, StructError::UndeclaredField(_)));

        let post = from_json_str::<Post>(r#"{"bogus": 1}"#, UnknownKeys::Discard).unwrap();
        assert_eq!(post, Post::default());
    }

    #[test]
    fn test_from_json_str_keeps_input_order() {
        let err = from_json_str::<Post>(r#"{"zulu": 1, "alpha": 2}"#, UnknownKeys::Reject)
            .unwrap_err();
        match err {
            StructError::UndeclaredField(e) => assert_eq!(e.field, "zulu"),
            other => panic!("Expected UndeclaredField, got: {other}"),
        }

        let map = map_from_json(json!({"b": 1, "a": 2, "c": 3})).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_from_json_str_malformed() {
        let err = from_json_str::<Post>("{not json", UnknownKeys::Reject).unwrap_err();
        assert!(matches!(err, StructError::Json(JsonError::Parse(_))));
    }
}
