//! Model Graph
//!
//! The [`ModelRegistry`] owns every descriptor of one generation run and maps
//! normalized names to them. Dependency edges live on the descriptors; the
//! registry projects them into a petgraph `DiGraph` for traversal and export.
//!
//! Control flow:
//! - `builder` turns definitions into descriptors (three passes)
//! - `deps` computes each descriptor's dependency list
//! - `crate::filter` prunes the registry by reachability

pub mod builder;
pub mod deps;
pub mod descriptor;
pub mod diagnostics;
pub mod types;

pub use builder::{BuildOutput, ModelBuilder};
pub use deps::DependencyResolver;
pub use descriptor::{
    ArrayModel, EnumMember, EnumModel, ModelId, ModelShape, ObjectModel, ParentRef,
    PropertyDescriptor, TypeDescriptor,
};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use types::{resolve_type, TypeExpr, VariantKind, VariantType};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::{HashMap, HashSet};

use crate::naming::normalize_key;

// =============================================================================
// Model Registry
// =============================================================================

/// All descriptors of one run, addressable by normalized name.
///
/// Each descriptor is reachable under the key of its schema name and the key
/// of its class name; both lead to the same [`ModelId`].
#[derive(Debug, Default)]
pub struct ModelRegistry {
    /// Arena, indexed by `ModelId`
    models: Vec<TypeDescriptor>,
    /// normalized key -> descriptor
    keys: IndexMap<String, ModelId>,
    /// Whether the descriptor at the same index is still registered
    members: Vec<bool>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted descriptor will receive.
    pub fn next_id(&self) -> ModelId {
        ModelId(self.models.len())
    }

    /// Registers a descriptor under its name and class name. Last write wins:
    /// a descriptor losing either of its keys to this one is dropped along
    /// with its remaining keys, so both names of a member always lead to the
    /// same descriptor. Returns the dropped ids.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> (ModelId, Vec<ModelId>) {
        let id = self.next_id();
        debug_assert_eq!(descriptor.id, id);

        let keys = [normalize_key(&descriptor.name), normalize_key(&descriptor.class_name)];
        self.models.push(descriptor);
        self.members.push(true);

        let mut displaced = Vec::new();
        for key in keys {
            if let Some(previous) = self.keys.insert(key, id) {
                if previous != id && !displaced.contains(&previous) {
                    displaced.push(previous);
                }
            }
        }
        for previous in &displaced {
            self.remove(*previous);
        }
        (id, displaced)
    }

    /// Looks up a descriptor by any of its names.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.lookup_id(name).map(|id| &self.models[id.0])
    }

    pub fn lookup_id(&self, name: &str) -> Option<ModelId> {
        self.keys.get(&normalize_key(name)).copied()
    }

    /// Descriptor by id, if still registered.
    pub fn descriptor(&self, id: ModelId) -> Option<&TypeDescriptor> {
        if self.contains(id) {
            self.models.get(id.0)
        } else {
            None
        }
    }

    pub(crate) fn descriptor_mut(&mut self, id: ModelId) -> Option<&mut TypeDescriptor> {
        if self.contains(id) {
            self.models.get_mut(id.0)
        } else {
            None
        }
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.members.get(id.0).copied().unwrap_or(false)
    }

    /// Registered descriptors, each once, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.models.iter().filter(move |d| self.members[d.id.0])
    }

    pub fn ids(&self) -> Vec<ModelId> {
        self.iter().map(|d| d.id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.iter().filter(|m| **m).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registry keys, insertion order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, ModelId)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Drops a descriptor from the registry. The descriptor itself is left
    /// untouched.
    pub fn remove(&mut self, id: ModelId) {
        if let Some(member) = self.members.get_mut(id.0) {
            *member = false;
            self.keys.retain(|_, v| *v != id);
        }
    }

    /// Class names of the given ids, skipping unregistered ones.
    pub fn class_names(&self, ids: &[ModelId]) -> Vec<&str> {
        ids.iter()
            .filter_map(|id| self.descriptor(*id))
            .map(|d| d.class_name.as_str())
            .collect()
    }

    // ========== Graph Views ==========

    /// Dependency graph over registered descriptors (edge = "depends on").
    pub fn dependency_graph(&self) -> (DiGraph<ModelId, ()>, HashMap<ModelId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.models.len(), self.models.len() * 2);
        let mut nodes = HashMap::with_capacity(self.models.len());

        for descriptor in self.iter() {
            nodes.insert(descriptor.id, graph.add_node(descriptor.id));
        }
        for descriptor in self.iter() {
            let from = nodes[&descriptor.id];
            for dep in &descriptor.dependencies {
                if let Some(&to) = nodes.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        (graph, nodes)
    }

    /// Every descriptor reachable from `seeds`, seeds included. Cycles are
    /// fine: the walk shares one visited set across all seeds.
    pub fn reachable_from(&self, seeds: impl IntoIterator<Item = ModelId>) -> HashSet<ModelId> {
        let (graph, nodes) = self.dependency_graph();
        let mut reached = HashSet::new();
        let mut dfs = Dfs::empty(&graph);

        for seed in seeds {
            let Some(&start) = nodes.get(&seed) else {
                continue;
            };
            if dfs.discovered.contains(start.index()) {
                continue;
            }
            dfs.move_to(start);
            while let Some(node) = dfs.next(&graph) {
                reached.insert(graph[node]);
            }
        }
        reached
    }

    /// Export the dependency graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let (graph, _) = self.dependency_graph();
        let mut output = String::new();

        output.push_str("digraph Models {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push('\n');

        for node in graph.node_indices() {
            let descriptor = &self.models[graph[node].0];
            let color = match descriptor.shape {
                ModelShape::Object(_) => "#00BCD4",
                ModelShape::Enum(_) => "#FF5722",
                ModelShape::Array(_) => "#4CAF50",
                ModelShape::Simple(_) => "#9E9E9E",
            };
            output.push_str(&format!(
                "  \"{}\" [fillcolor=\"{}\"];\n",
                descriptor.class_name, color
            ));
        }

        output.push('\n');

        for edge in graph.edge_references() {
            let source = &self.models[graph[edge.source()].0];
            let target = &self.models[graph[edge.target()].0];
            output.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                source.class_name, target.class_name
            ));
        }

        output.push_str("}\n");
        output
    }
}
