//! Operation Groups
//!
//! Groups the operations under `paths` by tag. Each group records which
//! models its operations reference, split into the success side (parameters
//! and 2xx results) and the error side (every other response), which is what
//! the usage filter walks from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::graph::types::VOID;
use crate::graph::{resolve_type, DependencyResolver, ModelId, ModelRegistry, TypeExpr, VariantType};
use crate::naming::{tag_name, to_doc_block, to_identifier};
use crate::schema::SwaggerDocument;

const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

// =============================================================================
// Descriptors
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// `path`, `query`, `header`, `formData` or `body`
    pub location: String,
    pub required: bool,
    pub comments: String,
    pub param_type: TypeExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// `operationId`, or derived from method and path
    pub id: String,
    pub method: String,
    pub path: String,
    pub comments: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// First 2xx response schema, `void` when there is none
    pub result_type: TypeExpr,
    /// Union of the non-2xx response schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<TypeExpr>,
}

/// All operations sharing one tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationGroup {
    /// Normalized tag
    pub name: String,
    pub operations: Vec<OperationDescriptor>,
    pub dependencies: Vec<ModelId>,
    pub error_dependencies: Vec<ModelId>,
}

/// Operation groups keyed by normalized tag, first-seen order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationSet {
    groups: IndexMap<String, OperationGroup>,
}

impl OperationSet {
    pub fn get(&self, name: &str) -> Option<&OperationGroup> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationGroup> {
        self.groups.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Removes a group, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<OperationGroup> {
        self.groups.shift_remove(name)
    }

    pub fn insert(&mut self, group: OperationGroup) {
        self.groups.insert(group.name.clone(), group);
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Builds the operation groups of `document`. Models are looked up in
/// `registry` to compute each group's dependencies.
pub fn collect_operations(
    document: &SwaggerDocument,
    registry: &ModelRegistry,
    default_tag: &str,
) -> OperationSet {
    let mut grouped: IndexMap<String, Vec<OperationDescriptor>> = IndexMap::new();

    for (path, item) in document.paths() {
        let shared = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for method in METHODS {
            let Some(operation) = item.get(method).filter(|op| op.is_object()) else {
                continue;
            };
            let tag = operation
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|tags| tags.first())
                .and_then(Value::as_str);
            let group = tag_name(tag, default_tag);

            let descriptor = build_operation(document.root(), path, method, operation, shared);
            debug!("Operation {} {} -> {} ({})", method, path, descriptor.id, group);
            grouped.entry(group).or_default().push(descriptor);
        }
    }

    let mut set = OperationSet::default();
    for (name, operations) in grouped {
        let mut success = DependencyResolver::unowned(registry);
        let mut errors = DependencyResolver::unowned(registry);
        for operation in &operations {
            for parameter in &operation.parameters {
                success.add(&parameter.param_type);
            }
            success.add(&operation.result_type);
            if let Some(error_type) = &operation.error_type {
                errors.add(error_type);
            }
        }

        let group = OperationGroup {
            name,
            operations,
            dependencies: success.get(),
            error_dependencies: errors.get(),
        };
        debug!(
            "Group {}: {} operation(s), uses [{}]",
            group.name,
            group.operations.len(),
            registry.class_names(&group.dependencies).join(", ")
        );
        set.insert(group);
    }
    set
}

fn build_operation(
    root: &Value,
    path: &str,
    method: &str,
    operation: &Value,
    shared: &[Value],
) -> OperationDescriptor {
    let id = operation
        .get("operationId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}{}", method, to_identifier(path)));

    let description = operation
        .get("description")
        .or_else(|| operation.get("summary"))
        .and_then(Value::as_str);

    OperationDescriptor {
        id,
        method: method.to_uppercase(),
        path: path.to_string(),
        comments: to_doc_block(description, 1),
        parameters: merge_parameters(root, shared, operation.get("parameters")),
        result_type: result_type(operation),
        error_type: error_type(operation),
    }
}

/// Path-level parameters followed by the operation's own; an operation
/// parameter with the same name and location replaces the shared one.
fn merge_parameters(root: &Value, shared: &[Value], own: Option<&Value>) -> Vec<ParameterDescriptor> {
    let own = own.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    let own: Vec<ParameterDescriptor> = own.iter().filter_map(|p| parameter(root, p)).collect();

    let mut merged: Vec<ParameterDescriptor> = shared
        .iter()
        .filter_map(|p| parameter(root, p))
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .collect();
    merged.extend(own);
    merged
}

fn parameter(root: &Value, raw: &Value) -> Option<ParameterDescriptor> {
    // Only the parameter itself is dereferenced; `$ref`s inside its schema
    // stay as named types.
    let resolved = raw
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.strip_prefix('#'))
        .and_then(|pointer| root.pointer(pointer))
        .unwrap_or(raw);
    let name = resolved.get("name").and_then(Value::as_str)?.to_string();
    let location = resolved
        .get("in")
        .and_then(Value::as_str)
        .unwrap_or("query")
        .to_string();

    let param_type = if location == "body" {
        resolved
            .get("schema")
            .map(resolve_type)
            .unwrap_or_else(TypeExpr::any)
    } else {
        resolve_type(resolved)
    };

    Some(ParameterDescriptor {
        required: resolved
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(location == "path"),
        comments: to_doc_block(resolved.get("description").and_then(Value::as_str), 1),
        name,
        location,
        param_type,
    })
}

fn responses(operation: &Value) -> impl Iterator<Item = (&String, &Value)> {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
}

fn is_success(code: &str) -> bool {
    code.len() == 3 && code.starts_with('2')
}

fn result_type(operation: &Value) -> TypeExpr {
    responses(operation)
        .filter(|(code, _)| is_success(code))
        .find_map(|(_, response)| response.get("schema"))
        .map(resolve_type)
        .unwrap_or_else(|| TypeExpr::named(VOID))
}

fn error_type(operation: &Value) -> Option<TypeExpr> {
    let mut types: Vec<TypeExpr> = Vec::new();
    for (_, response) in responses(operation).filter(|(code, _)| !is_success(code)) {
        if let Some(schema) = response.get("schema") {
            let ty = resolve_type(schema);
            if !types.iter().any(|t| t.to_string() == ty.to_string()) {
                types.push(ty);
            }
        }
    }

    match types.len() {
        0 => None,
        1 => types.pop(),
        _ => Some(TypeExpr::Variant(VariantType::union_of(&types, " | "))),
    }
}
