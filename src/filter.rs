//! Usage Filter
//!
//! Drops operation groups outside the tag selection, then (when pruning is
//! on) every model that no retained group reaches through the dependency
//! graph. Descriptors are never modified, only registry and group membership.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::config::FilterConfig;
use crate::graph::{ModelId, ModelRegistry};
use crate::naming::tag_name;
use crate::operations::OperationSet;

/// What the filter removed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterReport {
    pub removed_groups: Vec<String>,
    /// Raw names of the pruned models
    pub removed_models: Vec<String>,
}

impl FilterReport {
    pub fn is_empty(&self) -> bool {
        self.removed_groups.is_empty() && self.removed_models.is_empty()
    }
}

/// Normalized selection; `None` when the list is empty.
fn selection(tags: &[String], default_tag: &str) -> Option<HashSet<String>> {
    if tags.is_empty() {
        return None;
    }
    Some(tags.iter().map(|t| tag_name(Some(t), default_tag)).collect())
}

pub fn apply_tag_filter(
    registry: &mut ModelRegistry,
    groups: &mut OperationSet,
    config: &FilterConfig,
) -> FilterReport {
    let included = selection(&config.include_tags, &config.default_tag);
    let excluded = selection(&config.exclude_tags, &config.default_tag);
    let mut report = FilterReport::default();

    for name in groups.names() {
        let keep = included.as_ref().map_or(true, |set| set.contains(&name))
            && excluded.as_ref().map_or(true, |set| !set.contains(&name));
        if !keep {
            info!("Ignoring service {} because it was not included", name);
            groups.remove(&name);
            report.removed_groups.push(name);
        }
    }

    if !config.ignore_unused_models {
        return report;
    }

    let seeds: Vec<ModelId> = groups
        .iter()
        .flat_map(|g| g.dependencies.iter().chain(&g.error_dependencies))
        .copied()
        .collect();
    let used = registry.reachable_from(seeds);

    for id in registry.ids() {
        if used.contains(&id) {
            continue;
        }
        if let Some(descriptor) = registry.descriptor(id) {
            info!(
                "Ignoring model {} because it was not used by any service",
                descriptor.name
            );
            report.removed_models.push(descriptor.name.clone());
        }
        registry.remove(id);
    }

    report
}
