//! Swagger Models
//!
//! Compiles the `definitions` of a Swagger 2.0 contract into a resolved type
//! model for client code generation: one descriptor per definition, linked
//! inheritance, per-model dependency lists, and operation groups pruned by
//! tag selection and reachability.
//!
//! ## Features
//!
//! - **Type Resolution**: unions, intersections, tuples, inline objects and
//!   nullable markers, each carrying its rendering and its dependency names
//! - **Dual Lookup**: every model resolves by schema name and by identifier
//! - **Cycle Tolerance**: self-referential and mutually recursive schemas
//! - **Usage Pruning**: models no retained operation group reaches are dropped
//!
//! ## Pipeline
//!
//! ```text
//! swagger.json
//!   └── SwaggerDocument          (version check)
//!         ├── ModelBuilder       (classify → link hierarchy → dependencies)
//!         │     └── ModelRegistry
//!         ├── collect_operations (groups by tag)
//!         └── apply_tag_filter   (include/exclude, reachability)
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod graph;
pub mod naming;
pub mod operations;
pub mod schema;

pub use config::{FilterConfig, GeneratorConfig};
pub use error::{ModelError, Result};
pub use filter::{apply_tag_filter, FilterReport};
pub use graph::{
    Diagnostics, ModelBuilder, ModelId, ModelRegistry, ModelShape, TypeDescriptor, TypeExpr,
    VariantType,
};
pub use operations::{collect_operations, OperationGroup, OperationSet};
pub use schema::SwaggerDocument;

/// Everything a rendering stage needs from one run
#[derive(Debug)]
pub struct Compiled {
    pub models: ModelRegistry,
    pub groups: OperationSet,
    pub diagnostics: Diagnostics,
    pub report: FilterReport,
}

/// Builds the model registry and operation groups of `document` and applies
/// the tag filter.
pub fn compile(document: &SwaggerDocument, filter: &FilterConfig) -> Compiled {
    let output = ModelBuilder::new(document.definitions())
        .with_root(document.root())
        .build();
    let mut models = output.registry;
    let mut groups = collect_operations(document, &models, &filter.default_tag);
    let report = apply_tag_filter(&mut models, &mut groups, filter);

    tracing::debug!(
        "Compiled {} model(s) and {} group(s), {} diagnostic(s)",
        models.len(),
        groups.len(),
        output.diagnostics.len()
    );

    Compiled {
        models,
        groups,
        diagnostics: output.diagnostics,
        report,
    }
}
