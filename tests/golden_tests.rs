//! Golden Tests for Model Compilation
//!
//! Runs the whole pipeline over the petstore fixture and checks the resolved
//! model: lookups, shapes, dependency lists, hierarchy and tag pruning.

use serde_json::json;

use swagger_models::graph::{ModelShape, TypeExpr, VariantKind};
use swagger_models::naming::{normalize_key, to_identifier};
use swagger_models::{
    compile, Compiled, FilterConfig, ModelBuilder, ModelError, ModelRegistry, SwaggerDocument,
};

fn petstore() -> SwaggerDocument {
    SwaggerDocument::from_str(include_str!("fixtures/petstore.json")).unwrap()
}

/// Everything kept: no tag selection, no pruning.
fn compile_all() -> Compiled {
    let filter = FilterConfig {
        ignore_unused_models: false,
        ..FilterConfig::default()
    };
    compile(&petstore(), &filter)
}

fn deps(registry: &ModelRegistry, name: &str) -> Vec<String> {
    let model = registry.get(name).unwrap();
    registry
        .class_names(&model.dependencies)
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Registry Lookup Tests
// =============================================================================

#[test]
fn test_name_and_identifier_resolve_to_same_descriptor() {
    let doc = petstore();
    let compiled = compile_all();

    for name in doc.definitions().keys() {
        let by_name = compiled.models.lookup_id(&normalize_key(name));
        let by_identifier = compiled.models.lookup_id(&normalize_key(&to_identifier(name)));
        assert!(by_name.is_some(), "{} not registered", name);
        assert_eq!(by_name, by_identifier, "{} resolves to two descriptors", name);
    }

    let user = compiled.models.get("the-user").unwrap();
    assert_eq!(user.class_name, "TheUser");
    assert_eq!(user.file_stem, "theUser");
    assert_eq!(compiled.models.len(), doc.definitions().len());
}

#[test]
fn test_unsupported_version_is_fatal() {
    let err = SwaggerDocument::from_str(include_str!("fixtures/openapi3.json")).unwrap_err();
    match err {
        ModelError::UnsupportedVersion(version) => assert_eq!(version, "undefined"),
        other => panic!("Expected UnsupportedVersion, got {:?}", other),
    }
}

// =============================================================================
// Model Shape Tests
// =============================================================================

#[test]
fn test_object_properties() {
    let compiled = compile_all();
    let pet = compiled.models.get("Pet").unwrap();

    let obj = pet.as_object().unwrap();
    let names: Vec<&str> = obj.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["\"x-custom\"", "category", "count", "name", "tags"]);
    assert!(obj.properties.last().unwrap().is_last);
    assert!(obj.properties[3].required);
    assert!(pet.comments.contains("A pet in the store"));
}

#[test]
fn test_example_refs_resolved() {
    let compiled = compile_all();
    let pet = compiled.models.get("Pet").unwrap();

    assert_eq!(
        pet.example,
        Some(json!({"name": "Rex", "category": {"id": 1, "label": "dogs"}}))
    );
}

#[test]
fn test_tuple_lengths() {
    let compiled = compile_all();
    let point = compiled.models.get("Point").unwrap();

    match &point.shape {
        ModelShape::Array(array) => match &array.element_type {
            TypeExpr::Variant(v) => {
                assert_eq!(v.kind, VariantKind::Tuple);
                assert_eq!(v.rendered(), "[number] | [number, Tag]");
                assert_eq!(v.all_types(), ["number", "Tag"]);
            }
            other => panic!("Expected tuple variant, got {:?}", other),
        },
        other => panic!("Expected Array, got {:?}", other),
    }
    assert_eq!(deps(&compiled.models, "Point"), ["Tag"]);
}

#[test]
fn test_nested_union_flattened() {
    let compiled = compile_all();
    let shape = compiled.models.get("Shape").unwrap();

    match &shape.shape {
        ModelShape::Simple(TypeExpr::Variant(v)) => {
            assert_eq!(v.kind, VariantKind::Union);
            assert_eq!(v.all_types(), ["Animal", "Tag", "Leaf"]);
        }
        other => panic!("Expected union, got {:?}", other),
    }
    assert_eq!(deps(&compiled.models, "Shape"), ["Animal", "Tag", "Leaf"]);
}

// =============================================================================
// Dependency Tests
// =============================================================================

#[test]
fn test_self_reference_not_a_dependency() {
    let compiled = compile_all();
    assert_eq!(deps(&compiled.models, "Tree"), ["Leaf"]);

    for model in compiled.models.iter() {
        assert!(
            !model.dependencies.contains(&model.id),
            "{} depends on itself",
            model.class_name
        );
    }
}

#[test]
fn test_dependency_order() {
    let compiled = compile_all();
    let models = &compiled.models;

    assert_eq!(deps(models, "Pet"), ["Category", "Tag"]);
    assert_eq!(deps(models, "Dog"), ["Animal", "Pet"]);
    assert_eq!(deps(models, "Order"), ["Pet", "Receipt"]);
    assert_eq!(deps(models, "Receipt"), ["Point"]);
    assert!(deps(models, "Leaf").is_empty());
}

#[test]
fn test_all_of_parents_and_subclasses() {
    let compiled = compile_all();
    let models = &compiled.models;
    let dog = models.get("Dog").unwrap();
    let obj = dog.as_object().unwrap();

    let parents: Vec<(&str, bool)> = obj
        .parents
        .iter()
        .map(|p| (p.class_name.as_str(), p.is_first))
        .collect();
    assert_eq!(parents, [("Animal", true), ("Pet", false)]);
    assert_eq!(obj.properties[0].raw_name, "bark");

    for parent in ["Animal", "Pet"] {
        let subclasses = &models.get(parent).unwrap().as_object().unwrap().subclasses;
        assert_eq!(subclasses, &vec![dog.id], "{} lacks Dog", parent);
    }
}

// =============================================================================
// Usage Filter Tests
// =============================================================================

#[test]
fn test_include_tag_prunes_unreachable_models() {
    let filter = FilterConfig::default().including(["Pets"]);
    let compiled = compile(&petstore(), &filter);

    assert_eq!(compiled.groups.names(), ["Pets"]);

    let kept: Vec<&str> = compiled.models.iter().map(|m| m.class_name.as_str()).collect();
    assert_eq!(kept, ["Pet", "Category", "Tag", "Animal", "Dog", "Error"]);

    assert!(compiled.models.get("Order").is_none());
    assert!(compiled.models.get("Receipt").is_none());
    assert!(compiled.models.get("Point").is_none());
    assert_eq!(compiled.report.removed_groups, ["Orders"]);
}

#[test]
fn test_groups_and_operations() {
    let compiled = compile_all();
    let pets = compiled.groups.get("Pets").unwrap();

    let ids: Vec<&str> = pets.operations.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["listPets", "createPet"]);
    assert_eq!(compiled.models.class_names(&pets.dependencies), ["Pet", "Dog"]);
    assert_eq!(compiled.models.class_names(&pets.error_dependencies), ["Error"]);

    let orders = compiled.groups.get("Orders").unwrap();
    assert_eq!(orders.operations[0].parameters[0].name, "orderId");
}

#[test]
fn test_builder_without_document() {
    let doc = petstore();
    let out = ModelBuilder::new(doc.definitions()).build();

    assert!(out.diagnostics.is_empty());
    assert_eq!(out.registry.len(), doc.definitions().len());
}
