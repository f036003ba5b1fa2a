//! # JSON Schema Checker
//!
//! A [`ConstraintChecker`] that validates each record's own fields against
//! a JSON Schema (Draft 2020-12) selected by the record's type name.
//!
//! ## Schema Resolution
//!
//! Schemas live in one directory as `<TypeName>.schema.json`. A schema may
//! `$ref` another type's schema by file name (`"Address.schema.json"`) or by
//! its `$id`; references are resolved from the loaded set and never over
//! the network. Unresolvable references resolve to the empty schema.
//!
//! ## Projection
//!
//! The record is projected to a JSON object of its declared fields with
//! nested records expanded. Schemas should describe the local shape only:
//! nested records are validated again, against their own schema, when the
//! engine recurses into them.
//!
//! Violation paths are JSON Pointers rewritten as property paths
//! (`/lines/0/sku` → `lines[0].sku`). Violations are sorted by field
//! declaration order, record-level ones (e.g. `required`) first and paths
//! outside the declared fields last.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value as Json;
use strux_core::json::{value_from_json, value_to_json};
use strux_core::Structure;

use crate::checker::{sort_by_field_order, ConstraintChecker};
use crate::error::MetadataError;
use crate::report::Violation;

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Local retriever that resolves `$ref` URIs to schemas loaded in memory.
struct LocalSchemaRetriever {
    /// Map from file name or `$id` to schema value.
    schemas_by_uri: HashMap<String, Json>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Json, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        // Relative references resolve against the referring schema's base
        // URI; fall back to the trailing file name.
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        Ok(serde_json::json!({}))
    }
}

/// Checker evaluating per-type JSON Schemas.
pub struct SchemaChecker {
    /// Directory the schemas were loaded from, if any.
    schema_dir: Option<PathBuf>,
    /// Raw schemas by type name.
    schemas: HashMap<String, Json>,
    /// Compiled validators by type name.
    validators: HashMap<String, Validator>,
}

impl SchemaChecker {
    /// Load and compile every `<TypeName>.schema.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Load`] if the directory or a schema file
    /// cannot be read or parsed, and [`MetadataError::SchemaBuild`] if a
    /// schema does not compile.
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| MetadataError::Load {
            origin: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(type_name) = name.strip_suffix(SCHEMA_SUFFIX) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            let value: Json = serde_json::from_str(&content).map_err(|e| MetadataError::Load {
                origin: name.to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;
            schemas.insert(type_name.to_string(), value);
        }

        let mut checker = Self::from_schemas(schemas)?;
        checker.schema_dir = Some(schema_dir);
        Ok(checker)
    }

    /// Compile schemas supplied in memory, keyed by record type name.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::SchemaBuild`] if a schema does not compile.
    pub fn from_schemas<I, K>(schemas: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = (K, Json)>,
        K: Into<String>,
    {
        let schemas: HashMap<String, Json> =
            schemas.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut validators = HashMap::with_capacity(schemas.len());
        for (type_name, schema) in &schemas {
            let validator = build_options(&schemas).build(schema).map_err(|e| {
                MetadataError::SchemaBuild {
                    type_name: type_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            validators.insert(type_name.clone(), validator);
        }
        tracing::debug!(schemas = validators.len(), "compiled record schemas");

        Ok(Self {
            schema_dir: None,
            schemas,
            validators,
        })
    }

    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Type names with a schema, sorted alphabetically.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn get_schema(&self, type_name: &str) -> Option<&Json> {
        self.schemas.get(type_name)
    }
}

/// Build `ValidationOptions` with every loaded schema reachable by file
/// name and by `$id`.
fn build_options(schemas: &HashMap<String, Json>) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);

    let mut schemas_by_uri: HashMap<String, Json> = HashMap::new();
    for (type_name, value) in schemas {
        schemas_by_uri.insert(format!("{type_name}{SCHEMA_SUFFIX}"), value.clone());
        if let Some(id_str) = value.get("$id").and_then(|v| v.as_str()) {
            schemas_by_uri.insert(id_str.to_string(), value.clone());
        }
    }
    opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });

    opts
}

/// Rewrite a JSON Pointer as a property path: `/lines/0/sku` → `lines[0].sku`.
fn pointer_to_property_path(pointer: &str) -> String {
    let mut path = String::new();
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push_str(&format!("[{segment}]"));
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }
    path
}

impl ConstraintChecker for SchemaChecker {
    fn check(&self, record: &dyn Structure) -> Vec<Violation> {
        let Some(validator) = self.validators.get(record.type_name()) else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        let mut document = serde_json::Map::new();
        for (name, value) in record.fields() {
            match value_to_json(value) {
                Ok(json) => {
                    document.insert(name.to_string(), json);
                }
                Err(e) => violations.push(Violation::new(
                    name,
                    format!("This value cannot be represented as JSON ({e})."),
                    value.clone(),
                )),
            }
        }
        let document = Json::Object(document);

        for error in validator.iter_errors(&document) {
            let property_path = pointer_to_property_path(&error.instance_path.to_string());
            let message = error.to_string();
            let invalid_value = value_from_json(error.instance.into_owned());
            violations.push(Violation::new(property_path, message, invalid_value));
        }

        sort_by_field_order(record, &mut violations);
        violations
    }
}

impl fmt::Debug for SchemaChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaChecker")
            .field("schema_dir", &self.schema_dir)
            .field("types", &self.type_names())
            .finish()
    }
}
