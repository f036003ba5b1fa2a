//! # Built-in Field Constraints
//!
//! A [`Constraint`] checks one field value and yields a message on failure.
//! Constraints are plain data: they serialize to and from the mapping-file
//! format used by [`MetadataRegistry`](crate::MetadataRegistry) loaders,
//! e.g. `NotBlank` or `{ Length: { min: 3 } }`.
//!
//! ## Null Handling
//!
//! Every constraint except `NotNull` and `NotBlank` accepts `null`. Field
//! presence is never enforced implicitly; declare `NotNull` to require it.
//!
//! ## Type Mismatches
//!
//! No value is coerced. A string constraint applied to a non-string reports
//! a type violation instead of stringifying the value.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strux_core::{Value, ValueKind};

use crate::error::MetadataError;

/// A compiled regular expression that round-trips through its source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidPattern`] if `source` does not compile.
    pub fn new(source: &str) -> Result<Self, MetadataError> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| MetadataError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unanchored match, like a search anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = MetadataError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

/// A declarative rule evaluated against a single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// The value must not be `null`.
    NotNull,
    /// The value must not be `null`, `false`, `""`, `[]` or `{}`.
    NotBlank,
    /// The value must be of the given kind.
    Type { kind: ValueKind },
    /// String length in characters.
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Numeric bounds, inclusive. Integers and floats are both accepted.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Number of elements of a list or entries of a map.
    Count {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// The string must contain a match for the pattern.
    Regex { pattern: Pattern },
    /// The value must equal one of the listed values.
    Choice { choices: Vec<Value> },
    /// The string must look like an email address.
    Email,
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn type_message(kind: ValueKind) -> String {
    format!("This value should be of type {kind}.")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

fn check_length(len: usize, min: Option<usize>, max: Option<usize>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi && len != lo => Some(format!(
            "This value should have exactly {}.",
            plural(lo, "character")
        )),
        (Some(lo), _) if len < lo => Some(format!(
            "This value is too short. It should have {} or more.",
            plural(lo, "character")
        )),
        (_, Some(hi)) if len > hi => Some(format!(
            "This value is too long. It should have {} or less.",
            plural(hi, "character")
        )),
        _ => None,
    }
}

fn check_count(count: usize, min: Option<usize>, max: Option<usize>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi && count != lo => Some(format!(
            "This collection should contain exactly {}.",
            plural(lo, "element")
        )),
        (Some(lo), _) if count < lo => Some(format!(
            "This collection should contain {} or more.",
            plural(lo, "element")
        )),
        (_, Some(hi)) if count > hi => Some(format!(
            "This collection should contain {} or less.",
            plural(hi, "element")
        )),
        _ => None,
    }
}

fn check_range(n: f64, min: Option<f64>, max: Option<f64>) -> Option<String> {
    let below = min.is_some_and(|lo| n < lo);
    let above = max.is_some_and(|hi| n > hi);
    if !below && !above {
        return None;
    }
    Some(match (min, max) {
        (Some(lo), Some(hi)) => format!("This value should be between {lo} and {hi}."),
        (Some(lo), None) => format!("This value should be {lo} or more."),
        (None, Some(hi)) => format!("This value should be {hi} or less."),
        (None, None) => return None,
    })
}

impl Constraint {
    pub fn of_type(kind: ValueKind) -> Self {
        Self::Type { kind }
    }

    pub fn length(min: usize, max: usize) -> Self {
        Self::Length {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min_length(min: usize) -> Self {
        Self::Length {
            min: Some(min),
            max: None,
        }
    }

    pub fn max_length(max: usize) -> Self {
        Self::Length {
            min: None,
            max: Some(max),
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min(min: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn max(max: f64) -> Self {
        Self::Range {
            min: None,
            max: Some(max),
        }
    }

    pub fn count(min: usize, max: usize) -> Self {
        Self::Count {
            min: Some(min),
            max: Some(max),
        }
    }

    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidPattern`] if `pattern` does not compile.
    pub fn regex(pattern: &str) -> Result<Self, MetadataError> {
        Ok(Self::Regex {
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn choice<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Choice {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name of the constraint, as used in mapping files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotNull => "NotNull",
            Self::NotBlank => "NotBlank",
            Self::Type { .. } => "Type",
            Self::Length { .. } => "Length",
            Self::Range { .. } => "Range",
            Self::Count { .. } => "Count",
            Self::Regex { .. } => "Regex",
            Self::Choice { .. } => "Choice",
            Self::Email => "Email",
        }
    }

    /// Evaluate the constraint. Returns the violation message on failure.
    pub fn check(&self, value: &Value) -> Option<String> {
        match self {
            Self::NotNull => value
                .is_null()
                .then(|| "This value should not be null.".to_string()),
            Self::NotBlank => {
                is_blank(value).then(|| "This value should not be blank.".to_string())
            }
            _ if value.is_null() => None,
            Self::Type { kind } => (value.kind() != *kind).then(|| type_message(*kind)),
            Self::Length { min, max } => match value.as_str() {
                Some(s) => check_length(s.chars().count(), *min, *max),
                None => Some(type_message(ValueKind::String)),
            },
            Self::Range { min, max } => match value.as_f64() {
                Some(n) if !n.is_nan() => check_range(n, *min, *max),
                _ => Some("This value should be a valid number.".to_string()),
            },
            Self::Count { min, max } => match value {
                Value::List(items) => check_count(items.len(), *min, *max),
                Value::Map(map) => check_count(map.len(), *min, *max),
                _ => Some(type_message(ValueKind::List)),
            },
            Self::Regex { pattern } => match value.as_str() {
                Some(s) if pattern.is_match(s) => None,
                Some(_) => Some("This value is not valid.".to_string()),
                None => Some(type_message(ValueKind::String)),
            },
            Self::Choice { choices } => (!choices.contains(value))
                .then(|| "The value you selected is not a valid choice.".to_string()),
            Self::Email => match value.as_str() {
                Some(s) if is_email(s) => None,
                Some(_) => Some("This value is not a valid email address.".to_string()),
                None => Some(type_message(ValueKind::String)),
            },
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
