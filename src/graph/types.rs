//! Type Expressions
//!
//! Resolves a raw schema fragment (property, array items, or a whole
//! definition body) into either a concrete type name or a [`VariantType`].
//!
//! A variant carries its rendered text and its flattened dependency names as
//! sibling fields, both computed in the same construction step, so what gets
//! displayed and what gets tracked as a dependency can never diverge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::naming::simple_ref;

pub const NULL: &str = "null";
pub const ANY: &str = "any";
pub const VOID: &str = "void";
pub const OBJECT: &str = "object";

// =============================================================================
// Type Expression
// =============================================================================

/// How a variant type was formed (decides its rendering rule)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// `anyOf`/`oneOf`, nullable markers and type lists: `A | B`
    Union,
    /// `allOf`: `A & B`
    Intersection,
    /// Fixed-length tuples: `[A] | [A, B]`
    Tuple,
    /// Homogeneous arrays: `Array<A>`
    Array,
    /// Inline object literals: `{a: A, b?: B}`
    InlineObject,
}

/// A composite type expression over several underlying types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantType {
    pub kind: VariantKind,
    rendered: String,
    all_types: Vec<String>,
    /// Rendered alternatives of a union, nested unions spliced in
    #[serde(skip)]
    alternatives: Vec<String>,
}

impl VariantType {
    /// Builds a variant from its rendered form and the expressions it depends
    /// on. Nested variants are flattened and names deduplicated here.
    pub fn new(kind: VariantKind, rendered: impl Into<String>, parts: &[TypeExpr]) -> Self {
        Self {
            kind,
            rendered: rendered.into(),
            all_types: merge_types(parts),
            alternatives: Vec::new(),
        }
    }

    /// Union of `parts` joined with `separator`. Alternatives of nested unions
    /// are spliced in and each rendered alternative appears once, first
    /// occurrence kept.
    pub fn union_of(parts: &[TypeExpr], separator: &str) -> Self {
        let mut alternatives: Vec<String> = Vec::new();
        for part in parts {
            let pieces = match part {
                TypeExpr::Variant(v) if v.kind == VariantKind::Union && !v.alternatives.is_empty() => {
                    v.alternatives.clone()
                }
                other => vec![other.to_string()],
            };
            for piece in pieces {
                if !alternatives.contains(&piece) {
                    alternatives.push(piece);
                }
            }
        }

        Self {
            kind: VariantKind::Union,
            rendered: alternatives.join(separator),
            all_types: merge_types(parts),
            alternatives,
        }
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Flattened, deduplicated names of every concrete type underneath.
    pub fn all_types(&self) -> &[String] {
        &self.all_types
    }
}

/// A resolved type: either one concrete name or a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Named(String),
    Variant(VariantType),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn any() -> Self {
        Self::named(ANY)
    }

    pub fn is_variant(&self) -> bool {
        matches!(self, Self::Variant(_))
    }

    /// Names this expression depends on, flattened.
    pub fn all_types(&self) -> Vec<String> {
        match self {
            Self::Named(name) => vec![name.clone()],
            Self::Variant(v) => v.all_types.clone(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Variant(v) => f.write_str(&v.rendered),
        }
    }
}

/// Combines the dependency names of several expressions, first-seen order,
/// no duplicates.
pub fn merge_types(types: &[TypeExpr]) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for ty in types {
        let names = match ty {
            TypeExpr::Named(name) => std::slice::from_ref(name),
            TypeExpr::Variant(v) => v.all_types.as_slice(),
        };
        for name in names {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
    }
    all
}

/// Reduces a rendered type name to the name it references.
///
/// `Array<A>` and `A[]` become `A`, `null | A` becomes `A`, inline object
/// literals become the `object` sentinel.
pub fn strip_brackets(name: &str) -> String {
    if name.contains(' ') {
        return strip_brackets(&name.replace(' ', ""));
    }
    if name.starts_with('{') {
        return OBJECT.to_string();
    }
    if let Some(rest) = name.strip_prefix("null|") {
        return strip_brackets(rest);
    }
    if let Some(rest) = name.strip_prefix("undefined|") {
        return strip_brackets(rest);
    }
    if let Some(inner) = name.strip_prefix("Array<").and_then(|r| r.strip_suffix('>')) {
        return inner.to_string();
    }
    match name.find('[') {
        Some(pos) => name[..pos].to_string(),
        None => name.to_string(),
    }
}

fn join(parts: &[TypeExpr], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves a schema fragment into a type expression. First match wins:
/// null, `$ref`, `x-type`, `x-nullable`, `anyOf`/`oneOf`, `allOf`, type
/// lists, then the single primitive kind.
pub fn resolve_type(fragment: &Value) -> TypeExpr {
    let Some(obj) = fragment.as_object() else {
        return if fragment.is_null() {
            TypeExpr::named(NULL)
        } else {
            TypeExpr::any()
        };
    };

    match obj.get("type") {
        Some(Value::Null) => return TypeExpr::named(NULL),
        Some(Value::String(t)) if t == NULL => return TypeExpr::named(NULL),
        _ => {}
    }

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        if let Some(name) = simple_ref(reference) {
            return TypeExpr::Named(name);
        }
    }

    if let Some(x_type) = obj.get("x-type").filter(|v| !v.is_null()) {
        let text = match x_type {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let text = text.replace("List<", "Array<");
        return if text.is_empty() {
            TypeExpr::named(NULL)
        } else {
            TypeExpr::Named(text)
        };
    }

    if is_truthy(obj.get("x-nullable")) {
        let mut cleared = obj.clone();
        cleared.remove("x-nullable");
        let inner = resolve_type(&Value::Object(cleared));
        return TypeExpr::Variant(VariantType::union_of(
            &[TypeExpr::named(NULL), inner],
            " | ",
        ));
    }

    let untyped = obj.get("type").is_none();

    if untyped {
        if let Some(alternatives) = obj
            .get("anyOf")
            .or_else(|| obj.get("oneOf"))
            .and_then(Value::as_array)
        {
            let variants: Vec<TypeExpr> = alternatives.iter().map(resolve_type).collect();
            return TypeExpr::Variant(VariantType::union_of(&variants, " | "));
        }

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            let variants: Vec<TypeExpr> = parts
                .iter()
                .filter(|p| !is_truthy(p.get("x-nullable")))
                .map(resolve_type)
                .collect();
            return TypeExpr::Variant(VariantType::new(
                VariantKind::Intersection,
                join(&variants, " & "),
                &variants,
            ));
        }
    }

    if let Some(kinds) = obj.get("type").and_then(Value::as_array) {
        let variants: Vec<TypeExpr> = kinds
            .iter()
            .map(|kind| {
                let mut single = obj.clone();
                single.insert("type".to_string(), kind.clone());
                resolve_type(&Value::Object(single))
            })
            .collect();
        return TypeExpr::Variant(VariantType::union_of(&variants, " | "));
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("string") => resolve_string(fragment),
        Some("array") => resolve_array(fragment),
        Some("integer") | Some("number") => resolve_number(fragment),
        Some("boolean") => TypeExpr::named("boolean"),
        Some("file") => TypeExpr::named("Blob"),
        Some("object") => resolve_inline_object(fragment),
        _ => TypeExpr::any(),
    }
}

fn resolve_string(fragment: &Value) -> TypeExpr {
    if let Some(values) = non_empty_enum(fragment) {
        let literals: Vec<String> = values.iter().map(|v| format!("'{}'", literal_text(v))).collect();
        return TypeExpr::Named(literals.join(" | "));
    }
    if let Some(constant) = fragment.get("const").filter(|v| !v.is_null()) {
        return TypeExpr::Named(format!("'{}'", literal_text(constant)));
    }
    if fragment.get("format").and_then(Value::as_str) == Some("byte") {
        return TypeExpr::named("ArrayBuffer");
    }
    TypeExpr::named("string")
}

fn resolve_number(fragment: &Value) -> TypeExpr {
    if let Some(values) = non_empty_enum(fragment) {
        let literals: Vec<String> = values.iter().map(literal_text).collect();
        return TypeExpr::Named(literals.join(" | "));
    }
    if let Some(constant) = fragment.get("const").filter(|v| !v.is_null()) {
        return TypeExpr::Named(literal_text(constant));
    }
    TypeExpr::named("number")
}

fn resolve_array(fragment: &Value) -> TypeExpr {
    match fragment.get("items") {
        Some(Value::Array(items)) => resolve_tuple(fragment, items),
        Some(items) => {
            let item_type = resolve_type(items);
            let rendered = format!("Array<{item_type}>");
            TypeExpr::Variant(VariantType::new(VariantKind::Array, rendered, &[item_type]))
        }
        None => TypeExpr::Variant(VariantType::new(
            VariantKind::Array,
            "Array<any>",
            &[TypeExpr::any()],
        )),
    }
}

/// Tuples are enumerated per length between `minItems` and `maxItems`.
/// Without `maxItems`, or with `minItems` above it, the length cannot be
/// expressed and the result degrades to `Array<any>`. Lengths past the
/// declared items plus one padding slot all render alike, so the upper
/// bound stops there.
fn resolve_tuple(fragment: &Value, items: &[Value]) -> TypeExpr {
    let max_items = match fragment.get("maxItems").and_then(Value::as_u64) {
        Some(max) if max > 0 => max,
        _ => return TypeExpr::named("Array<any>"),
    };
    let min_items = fragment
        .get("minItems")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if min_items > max_items {
        return TypeExpr::named("Array<any>");
    }

    let mut slots: Vec<TypeExpr> = items.iter().map(resolve_type).collect();
    slots.push(match fragment.get("additionalItems") {
        Some(extra) if extra.is_object() => resolve_type(extra),
        _ => TypeExpr::any(),
    });

    let upper = usize::try_from(max_items).map_or(slots.len(), |max| max.min(slots.len()));
    let lower = usize::try_from(min_items).map_or(upper, |min| min.min(upper));

    let rendered = (lower..=upper)
        .map(|len| format!("[{}]", join(&slots[..len], ", ")))
        .collect::<Vec<_>>()
        .join(" | ");

    TypeExpr::Variant(VariantType::new(VariantKind::Tuple, rendered, &slots[..upper]))
}

fn resolve_inline_object(fragment: &Value) -> TypeExpr {
    let required: Vec<&str> = fragment
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut members: Vec<String> = Vec::new();
    let mut member_types: Vec<TypeExpr> = Vec::new();

    if let Some(props) = fragment.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            let ty = resolve_type(prop);
            let marker = if required.contains(&name.as_str()) { ": " } else { "?: " };
            members.push(format!("{name}{marker}{ty}"));
            member_types.push(ty);
        }
    }

    if let Some(value_type) = additional_properties_type(fragment) {
        members.push(format!("[key: string]: {value_type}"));
        member_types.push(value_type);
    }

    let rendered = format!("{{{}}}", members.join(", "));
    TypeExpr::Variant(VariantType::new(VariantKind::InlineObject, rendered, &member_types))
}

/// Value type of free-form keys: the resolved schema, `any` for `true`,
/// `None` when extra keys are not allowed.
pub fn additional_properties_type(fragment: &Value) -> Option<TypeExpr> {
    match fragment.get("additionalProperties") {
        Some(schema @ Value::Object(_)) => Some(resolve_type(schema)),
        Some(flag) if is_truthy(Some(flag)) => Some(TypeExpr::any()),
        _ => None,
    }
}

fn non_empty_enum(fragment: &Value) -> Option<&Vec<Value>> {
    fragment
        .get("enum")
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose truthiness for vendor flags, which show up as booleans or strings.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}
