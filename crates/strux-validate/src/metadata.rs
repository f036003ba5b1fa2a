//! # Constraint Metadata
//!
//! Per-type constraint declarations, keyed by record type name.
//!
//! ## Sources
//!
//! Metadata reaches a [`MetadataRegistry`] in one of two ways:
//!
//! 1. **In code** — a record type implements [`Constrained`] and is added
//!    with [`MetadataRegistry::register`]. Field names are checked against
//!    the type's field table at registration time.
//! 2. **Mapping files** — YAML or JSON documents of the form
//!
//!    ```yaml
//!    Address:
//!      street:
//!        - NotBlank
//!        - Length: { max: 64 }
//!      postcode:
//!        - Regex: { pattern: '^\d{4}$' }
//!    ```
//!
//!    loaded with [`MetadataRegistry::load_str`], [`MetadataRegistry::load_file`]
//!    or [`MetadataRegistry::load_dir`]. In YAML a tag may stand in for the
//!    constraint key (`- !Length { max: 64 }`). Files name types by string, so
//!    their field names can only be checked when a record is validated.
//!
//! Metadata for the same type from several sources is merged; constraints
//! on a field accumulate in the order they were added.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde_json::Value as Json;
use strux_core::{StructType, Structure};

use crate::constraint::Constraint;
use crate::error::MetadataError;
use crate::report::Violation;

/// Constraints declared for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    type_name: String,
    fields: Vec<(String, Vec<Constraint>)>,
}

impl ClassMetadata {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Append constraints to a field.
    pub fn field(
        &mut self,
        name: &str,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> &mut Self {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, existing)) => existing.extend(constraints),
            None => self
                .fields
                .push((name.to_string(), constraints.into_iter().collect())),
        }
        self
    }

    /// Constraints declared for `name`, empty if none.
    pub fn constraints(&self, name: &str) -> &[Constraint] {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, constraints)| constraints.as_slice())
            .unwrap_or_default()
    }

    /// Names of all constrained fields, in the order they were first declared.
    pub fn constrained_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }

    pub fn merge(&mut self, other: ClassMetadata) {
        for (name, constraints) in other.fields {
            self.field(&name, constraints);
        }
    }

    /// Evaluate every constraint against `record`'s own fields.
    ///
    /// Fields are visited in the record's declaration order, constraints in
    /// declaration order within a field. Nested records are not visited.
    pub fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        for name in self.constrained_fields() {
            if !record.declares(name) {
                tracing::warn!(
                    type_name = record.type_name(),
                    field = name,
                    "constraint metadata names an undeclared field"
                );
            }
        }

        let mut violations = Vec::new();
        for (name, value) in record.fields() {
            for constraint in self.constraints(name) {
                if let Some(message) = constraint.check(value) {
                    violations.push(Violation::new(name, message, value.clone()));
                }
            }
        }
        violations
    }
}

/// Record types that declare their own constraints in code.
///
/// ```
/// use strux_validate::{ClassMetadata, Constrained, Constraint};
///
/// strux_core::structure! {
///     pub struct Login {
///         pub email,
///         pub password,
///     }
/// }
///
/// impl Constrained for Login {
///     fn declare_constraints(metadata: &mut ClassMetadata) {
///         metadata
///             .field("email", [Constraint::NotBlank, Constraint::Email])
///             .field("password", [Constraint::min_length(12)]);
///     }
/// }
/// ```
pub trait Constrained: StructType {
    fn declare_constraints(metadata: &mut ClassMetadata);
}

/// Mapping-file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Yaml,
    Json,
}

impl MappingFormat {
    /// Format for a `*.constraints.{yaml,yml,json}` file name, if it is one.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name
            .strip_suffix(".yaml")
            .or_else(|| name.strip_suffix(".yml"))
            .map(|stem| (stem, Self::Yaml))
            .or_else(|| name.strip_suffix(".json").map(|stem| (stem, Self::Json)));
        match stem {
            Some((stem, format)) if stem.ends_with(".constraints") => Some(format),
            _ => None,
        }
    }
}

type MappingDocument = BTreeMap<String, BTreeMap<String, Vec<Constraint>>>;

/// Constraint metadata for any number of record types.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    classes: HashMap<String, ClassMetadata>,
    registered: HashSet<&'static str>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.classes.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<&ClassMetadata> {
        self.classes.get(type_name)
    }

    /// Add metadata, merging with anything already known for the type.
    pub fn insert(&mut self, metadata: ClassMetadata) {
        match self.classes.get_mut(metadata.type_name()) {
            Some(existing) => existing.merge(metadata),
            None => {
                self.classes
                    .insert(metadata.type_name().to_string(), metadata);
            }
        }
    }

    /// Register the code-declared constraints of `T`.
    ///
    /// The declarations are merged with any file-loaded metadata for the
    /// same type. Returns `Ok(false)` without touching the registry if `T`
    /// was already registered, so repeated registration never duplicates
    /// constraints.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::UnknownField`] if `T` declares constraints
    /// for a field it does not have.
    pub fn register<T: Constrained>(&mut self) -> Result<bool, MetadataError> {
        if self.registered.contains(T::TYPE_NAME) {
            return Ok(false);
        }
        let mut metadata = ClassMetadata::new(T::TYPE_NAME);
        T::declare_constraints(&mut metadata);
        if let Some(field) = metadata.constrained_fields().find(|f| !T::has_field(f)) {
            return Err(MetadataError::UnknownField {
                type_name: T::TYPE_NAME.to_string(),
                field: field.to_string(),
            });
        }
        tracing::debug!(type_name = T::TYPE_NAME, "registered constraint metadata");
        self.insert(metadata);
        self.registered.insert(T::TYPE_NAME);
        Ok(true)
    }

    /// Load a mapping document and merge it into the registry.
    ///
    /// Returns the number of record types the document describes.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Load`] if the text is not a valid mapping
    /// document (including patterns that do not compile).
    pub fn load_str(
        &mut self,
        text: &str,
        format: MappingFormat,
        origin: &str,
    ) -> Result<usize, MetadataError> {
        let load_error = |reason: String| MetadataError::Load {
            origin: origin.to_string(),
            reason,
        };

        let json = match format {
            MappingFormat::Json => serde_json::from_str::<Json>(text)
                .map_err(|e| load_error(format!("invalid JSON: {e}")))?,
            MappingFormat::Yaml => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(text)
                    .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
                mapping_yaml_to_json(&yaml, "")
                    .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))?
            }
        };

        // An empty YAML file parses to null.
        if json.is_null() {
            return Ok(0);
        }

        let document: MappingDocument = serde_json::from_value(json)
            .map_err(|e| load_error(format!("invalid constraint mapping: {e}")))?;
        let count = document.len();

        for (type_name, fields) in document {
            let mut metadata = ClassMetadata::new(type_name);
            for (field, constraints) in fields {
                metadata.field(&field, constraints);
            }
            self.insert(metadata);
        }
        tracing::debug!(origin, types = count, "loaded constraint mapping");
        Ok(count)
    }

    /// Load a single mapping file; the format follows the file extension
    /// (`.yaml`/`.yml` for YAML, anything else JSON).
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Load`] if the file cannot be read or parsed.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, MetadataError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| MetadataError::Load {
            origin: origin.clone(),
            reason: format!("cannot read file: {e}"),
        })?;

        let format = match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "yaml" | "yml" => MappingFormat::Yaml,
            _ => MappingFormat::Json,
        };
        self.load_str(&text, format, &origin)
    }

    /// Load every `*.constraints.{yaml,yml,json}` file in `dir`, in file
    /// name order. Returns the number of files loaded.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Load`] if the directory cannot be read or
    /// any mapping file is invalid.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, MetadataError> {
        let entries = std::fs::read_dir(dir).map_err(|e| MetadataError::Load {
            origin: dir.display().to_string(),
            reason: format!("cannot read metadata directory: {e}"),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_mapping = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(MappingFormat::from_file_name)
                .is_some();
            if is_mapping {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    /// Evaluate the metadata registered for `record`'s type.
    ///
    /// Types without metadata have no constraints and never fail.
    pub fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        self.get(record.type_name())
            .map(|metadata| metadata.check(record))
            .unwrap_or_default()
    }
}

/// Convert a YAML mapping document to the JSON shape the constraint
/// deserializer expects.
///
/// A tagged node is the YAML shorthand for a constraint: `!NotBlank`
/// becomes `"NotBlank"` and `!Length { max: 8 }` becomes
/// `{"Length": {"max": 8}}`. Keys are type, field, constraint or parameter
/// names, so anything but a string key is rejected with its location.
fn mapping_yaml_to_json(yaml: &serde_yaml::Value, at: &str) -> Result<Json, String> {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => Ok(Json::Null),
        Yaml::Bool(b) => Ok(Json::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Json::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Json::from(u))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .ok_or_else(|| format!("non-finite number {n} at {}", location(at)))
            }
        }
        Yaml::String(s) => Ok(Json::String(s.clone())),
        Yaml::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| mapping_yaml_to_json(item, &format!("{at}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let Yaml::String(key) = key else {
                    return Err(format!("non-string key {key:?} at {}", location(at)));
                };
                let child = if at.is_empty() {
                    key.clone()
                } else {
                    format!("{at}.{key}")
                };
                object.insert(key.clone(), mapping_yaml_to_json(value, &child)?);
            }
            Ok(Json::Object(object))
        }
        Yaml::Tagged(tagged) => {
            let name = tagged.tag.to_string().trim_start_matches('!').to_string();
            match &tagged.value {
                Yaml::Null => Ok(Json::String(name)),
                Yaml::String(s) if s.is_empty() => Ok(Json::String(name)),
                params => {
                    let params = mapping_yaml_to_json(params, &format!("{at}.{name}"))?;
                    let mut object = serde_json::Map::new();
                    object.insert(name, params);
                    Ok(Json::Object(object))
                }
            }
        }
    }
}

fn location(at: &str) -> &str {
    if at.is_empty() {
        "document root"
    } else {
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strux_core::{Value, ValueKind};

    strux_core::structure! {
        struct Account {
            pub handle,
            pub email,
            pub age,
        }
    }

    impl Constrained for Account {
        fn declare_constraints(metadata: &mut ClassMetadata) {
            metadata
                .field("handle", [Constraint::NotBlank, Constraint::max_length(8)])
                .field("age", [Constraint::min(18.0)]);
        }
    }

    strux_core::structure! {
        struct Broken {
            pub name,
        }
    }

    impl Constrained for Broken {
        fn declare_constraints(metadata: &mut ClassMetadata) {
            metadata.field("nmae", [Constraint::NotNull]);
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = MetadataRegistry::new();
        assert!(registry.register::<Account>().unwrap());
        assert!(!registry.register::<Account>().unwrap());
        assert_eq!(registry.get("Account").unwrap().constraints("handle").len(), 2);
    }

    #[test]
    fn test_register_rejects_unknown_field() {
        let mut registry = MetadataRegistry::new();
        let err = registry.register::<Broken>().unwrap_err();
        match err {
            MetadataError::UnknownField { type_name, field } => {
                assert_eq!(type_name, "Broken");
                assert_eq!(field, "nmae");
            }
            other => panic!("Expected UnknownField, got: {other}"),
        }
        assert!(!registry.contains("Broken"));
    }

    #[test]
    fn test_check_follows_declaration_order() {
        let mut registry = MetadataRegistry::new();
        registry.register::<Account>().unwrap();
        let account = Account {
            handle: Value::from("far-too-long"),
            email: Value::Null,
            age: Value::from(12),
        };
        let violations = registry.check(&account);
        let paths: Vec<&str> = violations.iter().map(|v| v.property_path.as_str()).collect();
        assert_eq!(paths, vec!["handle", "age"]);
        assert_eq!(violations[1].invalid_value, Value::from(12));
    }

    #[test]
    fn test_unregistered_type_has_no_constraints() {
        let registry = MetadataRegistry::new();
        assert!(registry.check(&Account::default()).is_empty());
    }

    #[test]
    fn test_load_yaml_mapping() {
        let yaml = r#"
Account:
  email:
    - NotBlank
    - Email
  age:
    - Type: { kind: int }
"#;
        let mut registry = MetadataRegistry::new();
        let count = registry.load_str(yaml, MappingFormat::Yaml, "inline").unwrap();
        assert_eq!(count, 1);
        let metadata = registry.get("Account").unwrap();
        assert_eq!(
            metadata.constraints("email"),
            &[Constraint::NotBlank, Constraint::Email]
        );
        assert_eq!(
            metadata.constraints("age"),
            &[Constraint::of_type(ValueKind::Int)]
        );
    }

    #[test]
    fn test_register_after_file_load_merges() {
        let mut registry = MetadataRegistry::new();
        registry
            .load_str("Account:\n  email: [Email]\n", MappingFormat::Yaml, "inline")
            .unwrap();
        assert!(registry.register::<Account>().unwrap());
        let metadata = registry.get("Account").unwrap();
        assert_eq!(metadata.constraints("email"), &[Constraint::Email]);
        assert_eq!(metadata.constraints("handle").len(), 2);
    }

    #[test]
    fn test_load_merges_with_registered_metadata() {
        let mut registry = MetadataRegistry::new();
        registry.register::<Account>().unwrap();
        registry
            .load_str(
                r#"{"Account": {"handle": [{"Regex": {"pattern": "^[a-z]+$"}}]}}"#,
                MappingFormat::Json,
                "inline",
            )
            .unwrap();
        assert_eq!(registry.get("Account").unwrap().constraints("handle").len(), 3);
    }

    #[test]
    fn test_load_invalid_mapping() {
        let mut registry = MetadataRegistry::new();
        let err = registry
            .load_str("Account: [1, 2]", MappingFormat::Yaml, "bad.constraints.yaml")
            .unwrap_err();
        match err {
            MetadataError::Load { origin, .. } => assert_eq!(origin, "bad.constraints.yaml"),
            other => panic!("Expected Load, got: {other}"),
        }
    }

    #[test]
    fn test_empty_yaml_loads_nothing() {
        let mut registry = MetadataRegistry::new();
        assert_eq!(registry.load_str("", MappingFormat::Yaml, "empty").unwrap(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mapping_file_names() {
        assert_eq!(
            MappingFormat::from_file_name("user.constraints.yaml"),
            Some(MappingFormat::Yaml)
        );
        assert_eq!(
            MappingFormat::from_file_name("user.constraints.yml"),
            Some(MappingFormat::Yaml)
        );
        assert_eq!(
            MappingFormat::from_file_name("user.constraints.json"),
            Some(MappingFormat::Json)
        );
        assert_eq!(MappingFormat::from_file_name("user.schema.json"), None);
        assert_eq!(MappingFormat::from_file_name("constraints.yaml"), None);
    }

    #[test]
    fn test_yaml_tags_as_constraint_shorthand() {
        let yaml = r#"
Account:
  handle:
    - !NotBlank
    - !Length { max: 8 }
  age:
    - !Range { min: 18 }
"#;
        let mut registry = MetadataRegistry::new();
        registry.load_str(yaml, MappingFormat::Yaml, "inline").unwrap();
        let metadata = registry.get("Account").unwrap();
        assert_eq!(
            metadata.constraints("handle"),
            &[Constraint::NotBlank, Constraint::max_length(8)]
        );
        assert_eq!(metadata.constraints("age"), &[Constraint::min(18.0)]);
    }

    #[test]
    fn test_yaml_non_string_key_located() {
        let yaml_value: serde_yaml::Value =
            serde_yaml::from_str("Account:\n  handle:\n    - Length: { 3: 8 }\n").unwrap();
        let err = mapping_yaml_to_json(&yaml_value, "").unwrap_err();
        assert!(err.contains("Account.handle[0].Length"), "{err}");
    }

    #[test]
    fn test_yaml_non_finite_number_rejected() {
        let mut registry = MetadataRegistry::new();
        let err = registry
            .load_str(
                "Account:\n  age:\n    - Range: { max: .inf }\n",
                MappingFormat::Yaml,
                "inline",
            )
            .unwrap_err();
        assert!(err.to_string().contains("Account.age[0].Range.max"), "{err}");
    }
}
