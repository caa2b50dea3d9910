//! Dependency graph logic for ordering entity emission
//!
//! This module provides functions to:
//! - Resolve each type's belongs-to references against the catalog
//! - Build the dependency and reference lists the scheduler reads
//! - Categorize entities as standalone, dependent, or junction

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, EntityType, Reference};

/// Represents the category of an entity in the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyCategory {
    /// Entity depends on no other populated type
    Standalone,
    /// Entity depends on exactly one other type
    Dependent,
    /// Entity depends on 2+ other types (join table)
    Junction,
}

impl DependencyCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standalone => "Standalone",
            Self::Dependent => "Dependent",
            Self::Junction => "Junction",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Standalone => "○",
            Self::Dependent => "→",
            Self::Junction => "⬌",
        }
    }
}

/// What a reference target turned out to be at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// Target type does not exist in the catalog
    Unresolved,
    /// Target exists but has no rows
    Empty,
    /// Target exists and has rows; carries the catalog spelling of its name
    Populated(String),
}

/// A declared reference paired with its resolved target
#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub reference: Reference,
    pub target: TargetStatus,
}

/// Dependency graph for a set of entities
///
/// Every input type has an entry in both maps, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Input types, in input order
    entities: Vec<EntityType>,
    /// Entity -> distinct populated types it refers to, self excluded
    dependencies: HashMap<String, Vec<String>>,
    /// Entity -> belongs-to references kept after pruning, self included
    references: HashMap<String, Vec<Reference>>,
    /// Reverse adjacency: entity -> input types that depend on it
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph from references already resolved against a catalog
    pub fn build(entries: Vec<(EntityType, Vec<ResolvedReference>)>) -> Self {
        let mut graph = DependencyGraph::default();

        for (entity, _) in &entries {
            graph.dependencies.entry(entity.name.clone()).or_default();
            graph.references.entry(entity.name.clone()).or_default();
            graph.dependents.entry(entity.name.clone()).or_default();
        }

        for (entity, resolved) in entries {
            let name = entity.name.clone();
            let mut seen = HashSet::new();
            let mut deps = Vec::new();
            let mut refs = Vec::new();

            for ResolvedReference { reference, target } in resolved {
                if !reference.is_belongs_to() {
                    continue;
                }
                let target = match target {
                    TargetStatus::Populated(target) => target,
                    TargetStatus::Unresolved => {
                        log::debug!(
                            "{}.{} refers to unknown type {} - ignored",
                            name, reference.field, reference.target
                        );
                        continue;
                    }
                    TargetStatus::Empty => {
                        log::debug!(
                            "{}.{} refers to empty type {} - no ordering needed",
                            name, reference.field, reference.target
                        );
                        continue;
                    }
                };

                log::debug!("{} depends on {} via {}", name, target, reference.field);

                // Self-references are recorded but never block their owner
                if target != name && seen.insert(target.clone()) {
                    deps.push(target.clone());
                }
                refs.push(Reference { target, ..reference });
            }

            for dep in &deps {
                if let Some(dependents) = graph.dependents.get_mut(dep) {
                    dependents.push(name.clone());
                }
            }
            graph.dependencies.insert(name.clone(), deps);
            graph.references.insert(name, refs);
            graph.entities.push(entity);
        }

        graph
    }

    /// Build a graph by reflecting every type's references through `catalog`
    pub async fn from_catalog<C: Catalog + ?Sized>(
        catalog: &C,
        types: &[EntityType],
    ) -> Result<Self> {
        let mut statuses: HashMap<String, TargetStatus> = HashMap::new();
        let mut entries = Vec::with_capacity(types.len());

        for entity in types {
            let mut resolved = Vec::new();
            for reference in catalog.references(entity).await? {
                if !reference.is_belongs_to() {
                    continue;
                }
                let target = match statuses.get(&reference.target) {
                    Some(status) => status.clone(),
                    None => {
                        let status = match catalog.resolve(&reference.target).await? {
                            None => TargetStatus::Unresolved,
                            Some(target) => {
                                if catalog.has_rows(&target.name).await? {
                                    TargetStatus::Populated(target.name)
                                } else {
                                    TargetStatus::Empty
                                }
                            }
                        };
                        statuses.insert(reference.target.clone(), status.clone());
                        status
                    }
                };
                resolved.push(ResolvedReference { reference, target });
            }
            entries.push((entity.clone(), resolved));
        }

        Ok(Self::build(entries))
    }

    pub fn entities(&self) -> &[EntityType] {
        &self.entities
    }

    /// Whether `name` was part of the input set
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Types `name` must be emitted after; empty for unknown names
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.dependencies.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// References recorded for `name`; empty for unknown names
    pub fn references(&self, name: &str) -> &[Reference] {
        self.references.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Input types that depend on `name`
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Categorize an entity based on its dependencies
    pub fn categorize(&self, name: &str) -> DependencyCategory {
        match self.dependencies(name).len() {
            0 => DependencyCategory::Standalone,
            1 => DependencyCategory::Dependent,
            _ => DependencyCategory::Junction,
        }
    }
}
