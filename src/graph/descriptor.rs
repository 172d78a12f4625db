//! Model Descriptors
//!
//! One [`TypeDescriptor`] per schema definition. The shape is a closed set of
//! variants decided once by the builder and never re-inferred.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::TypeExpr;

/// Stable handle of a descriptor inside a [`super::ModelRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelId(pub(crate) usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Type Descriptor
// =============================================================================

/// Resolved representation of one schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: ModelId,
    /// Name as declared under `definitions`
    pub name: String,
    /// Emitted type identifier
    pub class_name: String,
    /// File stem for the emitted type
    pub file_stem: String,
    /// File stem for the emitted example
    pub example_file_stem: String,
    /// Doc block built from `description`
    pub comments: String,
    /// `example` with internal references resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    pub shape: ModelShape,
    /// Other descriptors this one references, first-encountered order
    pub dependencies: Vec<ModelId>,
}

impl TypeDescriptor {
    pub fn is_object(&self) -> bool {
        matches!(self.shape, ModelShape::Object(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, ModelShape::Enum(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, ModelShape::Array(_))
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.shape, ModelShape::Simple(_))
    }

    pub fn as_object(&self) -> Option<&ObjectModel> {
        match &self.shape {
            ModelShape::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Option<&mut ObjectModel> {
        match &mut self.shape {
            ModelShape::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Whether the dependency pass applies. Enums never depend on anything,
    /// and neither does a simple type that is a single concrete name.
    pub fn has_dependencies(&self) -> bool {
        match &self.shape {
            ModelShape::Enum(_) => false,
            ModelShape::Simple(ty) => ty.is_variant(),
            _ => true,
        }
    }
}

/// Shape kind of a definition. Exactly one per descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum ModelShape {
    Object(ObjectModel),
    Enum(EnumModel),
    Array(ArrayModel),
    /// Unions and plain aliases (`string`, `number`, `any`, ...)
    Simple(TypeExpr),
}

impl ModelShape {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Simple(_) => "simple",
        }
    }
}

// =============================================================================
// Object
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectModel {
    /// Sorted by name, last one flagged
    pub properties: Vec<PropertyDescriptor>,
    /// Value type of free-form keys, if allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<TypeExpr>,
    /// Parent identifiers as declared in `allOf`
    pub parent_names: Vec<String>,
    /// Linked parents, declaration order
    pub parents: Vec<ParentRef>,
    /// Descriptors listing this one as a parent
    pub subclasses: Vec<ModelId>,
}

/// A linked parent of an object descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: ModelId,
    pub class_name: String,
    /// First declared parent, used as the primary base
    pub is_first: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Emitted name, quoted when not a bare identifier
    pub name: String,
    /// Name as declared in the schema
    pub raw_name: String,
    pub comments: String,
    pub required: bool,
    pub property_type: TypeExpr,
    pub is_last: bool,
}

// =============================================================================
// Enum / Array
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumModel {
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    /// Value with single quotes escaped
    pub value: String,
    pub is_last: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayModel {
    /// The whole array expression (`Array<T>` or a tuple union); its
    /// flattened names are the element types.
    pub element_type: TypeExpr,
}
