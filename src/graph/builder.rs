//! Model Builder
//!
//! Turns the `definitions` of a contract into registered [`TypeDescriptor`]s:
//!
//! 1. classify every definition and register it under both of its names
//! 2. link `allOf` parents and subclasses
//! 3. resolve each descriptor's dependency list
//!
//! Passes 2 and 3 need the full registry, since definitions reference each
//! other forward as often as backward.

use serde_json::{Map, Value};
use tracing::debug;

use super::deps::DependencyResolver;
use super::descriptor::{
    ArrayModel, EnumMember, EnumModel, ModelId, ModelShape, ObjectModel, ParentRef,
    PropertyDescriptor, TypeDescriptor,
};
use super::diagnostics::Diagnostics;
use super::types::{additional_properties_type, resolve_type, TypeExpr, VariantType};
use super::ModelRegistry;
use crate::naming::{
    normalize_key, property_name, simple_ref, to_doc_block, to_enum_name, to_file_stem,
    to_identifier,
};
use crate::schema::resolve_refs;

/// Result of a build: the registry and whatever was absorbed on the way.
#[derive(Debug)]
pub struct BuildOutput {
    pub registry: ModelRegistry,
    pub diagnostics: Diagnostics,
}

pub struct ModelBuilder<'a> {
    definitions: &'a Map<String, Value>,
    /// Whole document, used to resolve `$ref`s inside examples
    root: Option<&'a Value>,
    registry: ModelRegistry,
    diagnostics: Diagnostics,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(definitions: &'a Map<String, Value>) -> Self {
        Self {
            definitions,
            root: None,
            registry: ModelRegistry::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resolve references inside `example` values against `root`.
    pub fn with_root(mut self, root: &'a Value) -> Self {
        self.root = Some(root);
        self
    }

    pub fn build(mut self) -> BuildOutput {
        debug!("Classifying {} definitions", self.definitions.len());
        for (name, definition) in self.definitions {
            self.register(name, definition);
        }

        debug!("Linking hierarchies");
        self.link_hierarchy();

        debug!("Resolving dependencies");
        self.resolve_dependencies();

        BuildOutput {
            registry: self.registry,
            diagnostics: self.diagnostics,
        }
    }

    // ========== Pass 1: classification ==========

    fn register(&mut self, name: &str, definition: &Value) {
        let shape = self.classify(name, definition);
        scan_unbounded_tuples(name, definition, "#", &mut self.diagnostics);

        let class_name = to_identifier(name);
        let example = definition
            .get("example")
            .filter(|v| !v.is_null())
            .map(|example| match self.root {
                Some(root) => resolve_refs(example, root),
                None => example.clone(),
            });

        let descriptor = TypeDescriptor {
            id: self.registry.next_id(),
            name: name.to_string(),
            file_stem: to_file_stem(&class_name),
            example_file_stem: to_file_stem(name),
            comments: to_doc_block(definition.get("description").and_then(Value::as_str), 0),
            class_name,
            example,
            shape,
            dependencies: Vec::new(),
        };
        debug!(
            "Built {} descriptor {} ({})",
            descriptor.shape.kind(),
            descriptor.class_name,
            descriptor.name
        );

        let (_, displaced) = self.registry.insert(descriptor);
        for previous in displaced {
            let previous_name = self.name_of(previous);
            self.diagnostics
                .key_collision(name, &normalize_key(name), &previous_name);
        }
    }

    /// Raw name of a descriptor, even after it lost its registry membership.
    /// Ids follow definition order.
    fn name_of(&self, id: ModelId) -> String {
        self.definitions
            .keys()
            .nth(id.index())
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn classify(&mut self, name: &str, definition: &Value) -> ModelShape {
        let declared = definition.get("type");
        let untyped = declared.is_none();

        if let Some(parts) = definition
            .get("allOf")
            .and_then(Value::as_array)
            .filter(|parts| !parts.is_empty())
        {
            return ModelShape::Object(composed_object(definition, parts));
        }

        match declared.and_then(Value::as_str) {
            Some("string") => {
                return match enum_members(definition) {
                    Some(members) => ModelShape::Enum(EnumModel { members }),
                    None => ModelShape::Simple(resolve_type(definition)),
                };
            }
            Some("array") => {
                return ModelShape::Array(ArrayModel {
                    element_type: resolve_type(definition),
                });
            }
            _ => {}
        }

        if untyped {
            if let Some(alternatives) = definition
                .get("anyOf")
                .or_else(|| definition.get("oneOf"))
                .and_then(Value::as_array)
            {
                let variants: Vec<TypeExpr> = alternatives.iter().map(resolve_type).collect();
                return ModelShape::Simple(TypeExpr::Variant(VariantType::union_of(
                    &variants,
                    " |\n  ",
                )));
            }
            if let Some(members) = enum_members(definition) {
                return ModelShape::Enum(EnumModel { members });
            }
            if definition.get("properties").is_none()
                && definition.get("additionalProperties").is_none()
            {
                self.diagnostics.unknown_pattern(name);
                return ModelShape::Simple(TypeExpr::any());
            }
        }

        if untyped || declared.and_then(Value::as_str) == Some("object") {
            return ModelShape::Object(ObjectModel {
                properties: build_properties(
                    definition.get("properties"),
                    definition.get("required"),
                ),
                additional_properties: additional_properties_type(definition),
                ..ObjectModel::default()
            });
        }

        ModelShape::Simple(resolve_type(definition))
    }

    // ========== Pass 2: hierarchy ==========

    fn link_hierarchy(&mut self) {
        for child in self.registry.ids() {
            let Some(parent_names) = self
                .registry
                .descriptor(child)
                .and_then(TypeDescriptor::as_object)
                .map(|obj| obj.parent_names.clone())
            else {
                continue;
            };
            if parent_names.is_empty() {
                continue;
            }

            let child_name = self.name_of(child);
            let mut parents: Vec<ParentRef> = Vec::new();
            for parent_name in &parent_names {
                let parent = self
                    .registry
                    .lookup_id(parent_name)
                    .filter(|id| self.registry.descriptor(*id).is_some_and(TypeDescriptor::is_object));
                let Some(parent) = parent else {
                    self.diagnostics.unresolved_parent(&child_name, parent_name);
                    continue;
                };
                if parents.iter().any(|p| p.id == parent) {
                    continue;
                }

                let class_name = match self.registry.descriptor_mut(parent) {
                    Some(descriptor) => {
                        if let Some(obj) = descriptor.as_object_mut() {
                            obj.subclasses.push(child);
                        }
                        descriptor.class_name.clone()
                    }
                    None => continue,
                };
                parents.push(ParentRef {
                    id: parent,
                    class_name,
                    is_first: parents.is_empty(),
                });
            }

            if let Some(obj) = self
                .registry
                .descriptor_mut(child)
                .and_then(TypeDescriptor::as_object_mut)
            {
                obj.parents = parents;
            }
        }
    }

    // ========== Pass 3: dependencies ==========

    fn resolve_dependencies(&mut self) {
        let mut resolved: Vec<(ModelId, Vec<ModelId>)> = Vec::new();

        for descriptor in self.registry.iter() {
            if !descriptor.has_dependencies() {
                continue;
            }
            let mut resolver = DependencyResolver::for_model(&self.registry, descriptor.id);

            match &descriptor.shape {
                ModelShape::Object(obj) => {
                    // Declared names, so non-object parents still count
                    for parent in &obj.parent_names {
                        resolver.add_name(parent);
                    }
                    for property in &obj.properties {
                        resolver.add(&property.property_type);
                    }
                    if let Some(value_type) = &obj.additional_properties {
                        resolver.add(value_type);
                    }
                }
                ModelShape::Array(array) => resolver.add(&array.element_type),
                ModelShape::Simple(ty) => resolver.add(ty),
                ModelShape::Enum(_) => {}
            }

            let dependencies = resolver.get();
            debug!(
                "{} depends on [{}]",
                descriptor.class_name,
                self.registry.class_names(&dependencies).join(", ")
            );
            resolved.push((descriptor.id, dependencies));
        }

        for (id, dependencies) in resolved {
            if let Some(descriptor) = self.registry.descriptor_mut(id) {
                descriptor.dependencies = dependencies;
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Object built from `allOf`: `$ref` members are parents, properties come
/// from the first member declaring any, else from the definition itself.
fn composed_object(definition: &Value, parts: &[Value]) -> ObjectModel {
    let parent_names = parts
        .iter()
        .filter_map(|part| part.get("$ref").and_then(Value::as_str))
        .filter_map(simple_ref)
        .collect();

    let properties = parts
        .iter()
        .find_map(|part| part.get("properties"))
        .or_else(|| definition.get("properties"));
    let required = parts
        .iter()
        .find_map(|part| part.get("required"))
        .or_else(|| definition.get("required"));

    ObjectModel {
        properties: build_properties(properties, required),
        parent_names,
        ..ObjectModel::default()
    }
}

/// Properties sorted by emitted name (stable, so quoted names come first),
/// last one flagged.
fn build_properties(properties: Option<&Value>, required: Option<&Value>) -> Vec<PropertyDescriptor> {
    let Some(properties) = properties.and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = required
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut result: Vec<PropertyDescriptor> = properties
        .iter()
        .map(|(raw_name, property)| PropertyDescriptor {
            name: property_name(raw_name),
            raw_name: raw_name.clone(),
            comments: to_doc_block(property.get("description").and_then(Value::as_str), 1),
            required: required.contains(&raw_name.as_str()),
            property_type: resolve_type(property),
            is_last: false,
        })
        .collect();

    result.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(last) = result.last_mut() {
        last.is_last = true;
    }
    result
}

fn enum_members(definition: &Value) -> Option<Vec<EnumMember>> {
    let values = definition
        .get("enum")
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())?;

    let count = values.len();
    let members = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            EnumMember {
                name: to_enum_name(&text),
                value: text.replace('\'', "\\'"),
                is_last: i + 1 == count,
            }
        })
        .collect();
    Some(members)
}

/// Reports every tuple-form array below `value` that declares no usable
/// `maxItems`; those resolve to `Array<any>`.
fn scan_unbounded_tuples(schema_id: &str, value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    match value {
        Value::Object(obj) => {
            let bounded = obj
                .get("maxItems")
                .and_then(Value::as_u64)
                .is_some_and(|max| max > 0);
            if obj.get("type").and_then(Value::as_str) == Some("array")
                && obj.get("items").is_some_and(Value::is_array)
                && !bounded
            {
                diagnostics.unbounded_tuple(schema_id, path);
            }
            for (key, child) in obj {
                if key == "example" {
                    continue;
                }
                scan_unbounded_tuples(schema_id, child, &format!("{path}/{key}"), diagnostics);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                scan_unbounded_tuples(schema_id, child, &format!("{path}/{i}"), diagnostics);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::diagnostics::DiagnosticCode;
    use serde_json::json;

    fn build(definitions: Value) -> BuildOutput {
        ModelBuilder::new(definitions.as_object().unwrap()).build()
    }

    #[test]
    fn test_classifies_each_shape() {
        let out = build(json!({
            "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Color": {"type": "string", "enum": ["red", "green"]},
            "Tags": {"type": "array", "items": {"type": "string"}},
            "Id": {"type": "string"},
            "Shape": {"anyOf": [{"$ref": "#/definitions/Pet"}, {"type": "number"}]},
            "Size": {"type": "integer"}
        }));
        let registry = out.registry;

        assert!(registry.get("Pet").unwrap().is_object());
        assert!(registry.get("Color").unwrap().is_enum());
        assert!(registry.get("Tags").unwrap().is_array());
        assert!(registry.get("Id").unwrap().is_simple());
        assert!(registry.get("Size").unwrap().is_simple());

        match &registry.get("Shape").unwrap().shape {
            ModelShape::Simple(TypeExpr::Variant(v)) => {
                assert_eq!(v.rendered(), "Pet |\n  number");
                assert_eq!(v.all_types(), ["Pet", "number"]);
            }
            other => panic!("Expected union, got {:?}", other),
        }
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_properties_sorted_and_last_flagged() {
        let out = build(json!({
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "x-custom": {"type": "string"},
                    "name": {"type": "string", "description": "Pet name"},
                    "count": {"type": "integer"}
                }
            }
        }));
        let pet = out.registry.get("Pet").unwrap();
        let props = &pet.as_object().unwrap().properties;

        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["\"x-custom\"", "count", "name"]);
        assert!(props[2].is_last);
        assert!(!props[0].is_last && !props[1].is_last);
        assert!(props[2].required);
        assert!(!props[1].required);
        assert!(props[2].comments.contains("Pet name"));
    }

    #[test]
    fn test_enum_members() {
        let out = build(json!({
            "Status": {"type": "string", "enum": ["in-stock", "it's", "2fast"]}
        }));
        let status = out.registry.get("Status").unwrap();
        let ModelShape::Enum(model) = &status.shape else {
            panic!("Expected enum, got {:?}", status.shape);
        };

        assert_eq!(model.members[0].name, "IN_STOCK");
        assert_eq!(model.members[1].value, "it\\'s");
        assert_eq!(model.members[2].name, "_2FAST");
        assert!(model.members[2].is_last);
        assert!(status.dependencies.is_empty());
    }

    #[test]
    fn test_all_of_links_parents_both_ways() {
        let out = build(json!({
            "Dog": {"allOf": [
                {"$ref": "#/definitions/Animal"},
                {"$ref": "#/definitions/Pet"},
                {"properties": {"bark": {"type": "boolean"}}}
            ]},
            "Animal": {"type": "object", "properties": {"legs": {"type": "integer"}}},
            "Pet": {"type": "object", "properties": {"name": {"type": "string"}}}
        }));
        let registry = &out.registry;
        let dog = registry.get("Dog").unwrap();
        let obj = dog.as_object().unwrap();

        assert_eq!(obj.parents.len(), 2);
        assert_eq!(obj.parents[0].class_name, "Animal");
        assert!(obj.parents[0].is_first);
        assert!(!obj.parents[1].is_first);
        assert_eq!(obj.properties[0].raw_name, "bark");

        for parent in ["Animal", "Pet"] {
            let subclasses = &registry.get(parent).unwrap().as_object().unwrap().subclasses;
            assert_eq!(subclasses, &vec![dog.id]);
        }
        assert_eq!(registry.class_names(&dog.dependencies), ["Animal", "Pet"]);
    }

    #[test]
    fn test_missing_parent_is_reported_not_fatal() {
        let out = build(json!({
            "Dog": {"allOf": [{"$ref": "#/definitions/Ghost"}, {"properties": {}}]}
        }));
        let dog = out.registry.get("Dog").unwrap();

        assert!(dog.as_object().unwrap().parents.is_empty());
        assert_eq!(out.diagnostics.all()[0].code, DiagnosticCode::UnresolvedParent);
    }

    #[test]
    fn test_non_object_parents_are_still_dependencies() {
        let out = build(json!({
            "Child": {"allOf": [
                {"$ref": "#/definitions/Id"},
                {"$ref": "#/definitions/Status"},
                {"properties": {"note": {"type": "string"}}}
            ]},
            "Id": {"type": "string"},
            "Status": {"type": "string", "enum": ["on", "off"]}
        }));
        let registry = &out.registry;
        let child = registry.get("Child").unwrap();

        assert!(child.as_object().unwrap().parents.is_empty());
        assert_eq!(registry.class_names(&child.dependencies), ["Id", "Status"]);
    }

    #[test]
    fn test_dependency_order() {
        let out = build(json!({
            "Base": {"type": "object"},
            "Child": {"allOf": [{"$ref": "#/definitions/Base"}], "properties": {
                "zeta": {"$ref": "#/definitions/Zeta"},
                "alpha": {"$ref": "#/definitions/Alpha"}
            }},
            "Map": {"type": "object", "properties": {"first": {"$ref": "#/definitions/Alpha"}},
                    "additionalProperties": {"$ref": "#/definitions/Zeta"}},
            "Alpha": {"type": "string"},
            "Zeta": {"type": "string"}
        }));
        let registry = &out.registry;

        let child = registry.get("Child").unwrap();
        assert_eq!(registry.class_names(&child.dependencies), ["Base", "Alpha", "Zeta"]);

        let map = registry.get("Map").unwrap();
        assert_eq!(registry.class_names(&map.dependencies), ["Alpha", "Zeta"]);
    }

    #[test]
    fn test_self_reference_excluded() {
        let out = build(json!({
            "tree-node": {"type": "object", "properties": {
                "children": {"type": "array", "items": {"$ref": "#/definitions/TreeNode"}},
                "parent": {"$ref": "#/definitions/tree-node"}
            }}
        }));
        let node = out.registry.get("TreeNode").unwrap();
        assert!(node.dependencies.is_empty());
    }

    #[test]
    fn test_unclassifiable_falls_back_to_any() {
        let out = build(json!({"Blob": {"description": "anything"}}));
        let blob = out.registry.get("Blob").unwrap();

        match &blob.shape {
            ModelShape::Simple(TypeExpr::Named(name)) => assert_eq!(name, "any"),
            other => panic!("Expected any, got {:?}", other),
        }
        assert_eq!(out.diagnostics.all()[0].code, DiagnosticCode::UnknownPattern);
    }

    #[test]
    fn test_unbounded_tuple_reported() {
        let out = build(json!({
            "Pair": {"type": "object", "properties": {
                "coords": {"type": "array", "items": [{"type": "number"}, {"type": "number"}]}
            }}
        }));
        let item = &out.diagnostics.all()[0];
        assert_eq!(item.code, DiagnosticCode::UnboundedTuple);
        assert_eq!(item.context, ["at #/properties/coords"]);
    }

    #[test]
    fn test_key_collision_reported() {
        let out = build(json!({
            "pet": {"type": "string"},
            "Pet": {"type": "integer"}
        }));
        let item = &out.diagnostics.all()[0];
        assert_eq!(item.code, DiagnosticCode::KeyCollision);
        assert_eq!(item.schema_id, "Pet");
        assert_eq!(out.registry.len(), 1);
    }

    #[test]
    fn test_example_refs_resolved_against_root() {
        let root = json!({
            "swagger": "2.0",
            "x-examples": {"name": "Rex"},
            "definitions": {
                "Pet": {"type": "object", "example": {"name": {"$ref": "#/x-examples/name"}}}
            }
        });
        let definitions = root["definitions"].as_object().unwrap();
        let out = ModelBuilder::new(definitions).with_root(&root).build();

        let pet = out.registry.get("Pet").unwrap();
        assert_eq!(pet.example, Some(json!({"name": "Rex"})));
        assert_eq!(pet.example_file_stem, "pet");
    }
}
