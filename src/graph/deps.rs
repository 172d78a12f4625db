//! Dependency Resolution
//!
//! Accumulates, for one owner, the descriptors it references. Variants are
//! expanded through their flattened names, array wrapping is stripped, and
//! names that resolve to nothing are dropped: forward references to types
//! outside the processed set are expected.

use std::collections::HashSet;

use super::descriptor::ModelId;
use super::types::{strip_brackets, TypeExpr};
use super::ModelRegistry;

pub struct DependencyResolver<'a> {
    registry: &'a ModelRegistry,
    /// Never recorded as a dependency of itself
    owner: Option<ModelId>,
    seen: HashSet<ModelId>,
    dependencies: Vec<ModelId>,
}

impl<'a> DependencyResolver<'a> {
    /// Resolver for a descriptor; references back to `owner` are ignored.
    pub fn for_model(registry: &'a ModelRegistry, owner: ModelId) -> Self {
        Self {
            registry,
            owner: Some(owner),
            seen: HashSet::new(),
            dependencies: Vec::new(),
        }
    }

    /// Resolver without a self-exclusion, used for operation groups.
    pub fn unowned(registry: &'a ModelRegistry) -> Self {
        Self {
            registry,
            owner: None,
            seen: HashSet::new(),
            dependencies: Vec::new(),
        }
    }

    /// Adds a candidate type expression.
    pub fn add(&mut self, candidate: &TypeExpr) {
        match candidate {
            TypeExpr::Named(name) => self.add_name(name),
            TypeExpr::Variant(variant) => {
                for name in variant.all_types() {
                    self.add_name(name);
                }
            }
        }
    }

    /// Adds a candidate by name (rendered or raw).
    pub fn add_name(&mut self, name: &str) {
        let base = strip_brackets(name);
        let Some(id) = self.registry.lookup_id(&base) else {
            return;
        };
        if Some(id) == self.owner {
            return;
        }
        if self.seen.insert(id) {
            self.dependencies.push(id);
        }
    }

    /// Accumulated descriptors, first-encountered order.
    pub fn get(self) -> Vec<ModelId> {
        self.dependencies
    }
}
