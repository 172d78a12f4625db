//! Contract document
//!
//! A loaded Swagger 2.0 document. Only the version check happens up front;
//! everything below `definitions` and `paths` is interpreted lazily by the
//! model builder and the operation grouping.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ModelError, Result};

/// A Swagger 2.0 document held in memory
#[derive(Debug, Clone)]
pub struct SwaggerDocument {
    root: Value,
    empty: Map<String, Value>,
}

impl SwaggerDocument {
    /// Accepts a parsed document. Anything other than a `"swagger": "2.0"`
    /// object is rejected before any model work starts.
    pub fn from_value(root: Value) -> Result<Self> {
        let Some(obj) = root.as_object() else {
            return Err(ModelError::InvalidDocument(
                "document root must be a JSON object".to_string(),
            ));
        };

        match obj.get("swagger") {
            Some(Value::String(version)) if version == "2.0" => {}
            Some(Value::String(version)) => {
                return Err(ModelError::UnsupportedVersion(version.clone()))
            }
            Some(other) => return Err(ModelError::UnsupportedVersion(other.to_string())),
            None => return Err(ModelError::UnsupportedVersion("undefined".to_string())),
        }

        for section in ["definitions", "paths"] {
            if let Some(value) = obj.get(section) {
                if !value.is_object() && !value.is_null() {
                    return Err(ModelError::InvalidDocument(format!(
                        "'{}' must be an object",
                        section
                    )));
                }
            }
        }

        Ok(Self {
            root,
            empty: Map::new(),
        })
    }

    pub fn from_str(content: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Whole document, used for `$ref` lookups.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// `definitions`, or an empty map when absent.
    pub fn definitions(&self) -> &Map<String, Value> {
        self.section("definitions")
    }

    /// `paths`, or an empty map when absent.
    pub fn paths(&self) -> &Map<String, Value> {
        self.section("paths")
    }

    fn section(&self, name: &str) -> &Map<String, Value> {
        self.root
            .get(name)
            .and_then(Value::as_object)
            .unwrap_or(&self.empty)
    }
}

// =============================================================================
// Reference resolution
// =============================================================================

/// Replaces every internal `{"$ref": "#/..."}` below `value` with the value it
/// points to in `root`, recursively. A reference met again while it is being
/// expanded is left as is, as are external and dangling references.
pub fn resolve_refs(value: &Value, root: &Value) -> Value {
    let mut active: Vec<String> = Vec::new();
    resolve_inner(value, root, &mut active)
}

fn resolve_inner(value: &Value, root: &Value, active: &mut Vec<String>) -> Value {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                if let Some(pointer) = reference.strip_prefix('#') {
                    if active.iter().any(|r| r == reference) {
                        return value.clone();
                    }
                    if let Some(target) = root.pointer(pointer) {
                        active.push(reference.to_string());
                        let resolved = resolve_inner(target, root, active);
                        active.pop();
                        return resolved;
                    }
                }
                return value.clone();
            }
            Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), resolve_inner(v, root, active)))
                    .collect(),
            )
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| resolve_inner(v, root, active)).collect())
        }
        other => other.clone(),
    }
}
