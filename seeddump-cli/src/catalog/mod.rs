//! Data-store reflection layer
//!
//! This module provides:
//! - The `EntityType` and `Reference` model shared by the planner
//! - The `Catalog` trait implemented by concrete stores
//! - Candidate selection (filtering out system, missing and empty types)

pub mod naming;
pub mod registry;
pub mod sqlite;

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

pub use registry::StaticCatalog;
pub use sqlite::SqliteCatalog;

/// One exportable kind of record (a table)
///
/// Identity is the name alone; `has_rows` is a snapshot taken when the
/// type was resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub has_rows: bool,
}

impl EntityType {
    pub fn new(name: impl Into<String>, has_rows: bool) -> Self {
        Self {
            name: name.into(),
            has_rows,
        }
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declared kind of an association between two types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// The owning type holds the foreign key and needs the target row to exist
    BelongsTo,
    HasOne,
    HasMany,
    ManyToMany,
}

/// A declared pointer from one type to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Field (column) holding the key on the owning type
    pub field: String,
    /// Declared target type name; may not resolve
    pub target: String,
    pub kind: ReferenceKind,
}

impl Reference {
    pub fn belongs_to(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind: ReferenceKind::BelongsTo,
        }
    }

    pub fn is_belongs_to(&self) -> bool {
        matches!(self.kind, ReferenceKind::BelongsTo)
    }
}

/// Reflection over a data store
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All types in the store, in catalog order
    async fn list_types(&self) -> Result<Vec<EntityType>>;

    /// Look up a type by its exact name
    async fn resolve(&self, name: &str) -> Result<Option<EntityType>>;

    async fn type_exists(&self, name: &str) -> Result<bool> {
        Ok(self.resolve(name).await?.is_some())
    }

    async fn has_rows(&self, name: &str) -> Result<bool>;

    /// References declared by `entity`, in declaration order
    async fn references(&self, entity: &EntityType) -> Result<Vec<Reference>>;

    /// Bookkeeping types that are never exported
    fn is_system(&self, name: &str) -> bool;
}

/// Produce the ordered candidate list for a run
///
/// With no selector every catalog type is considered in catalog order.
/// Selector entries are resolved through [`naming::resolve_name`]; an entry
/// that matches nothing fails the whole selection.
pub async fn select_candidates<C: Catalog + ?Sized>(
    catalog: &C,
    selector: Option<&[String]>,
) -> std::result::Result<Vec<EntityType>, SelectionError> {
    let all = catalog
        .list_types()
        .await
        .map_err(SelectionError::Catalog)?;

    let requested: Vec<String> = match selector {
        None => all.iter().map(|t| t.name.clone()).collect(),
        Some(names) => {
            let known: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
            let mut resolved = Vec::with_capacity(names.len());
            for raw in names {
                let wanted = raw.trim();
                if wanted.is_empty() {
                    continue;
                }
                match naming::resolve_name(wanted, &known) {
                    Some(name) => resolved.push(name.to_string()),
                    None => {
                        return Err(SelectionError::UnknownEntity {
                            name: wanted.to_string(),
                        });
                    }
                }
            }
            resolved
        }
    };

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for name in requested {
        if !seen.insert(name.clone()) {
            continue;
        }
        if catalog.is_system(&name) {
            log::debug!("Skipping system type {}", name);
            continue;
        }
        let entity = match catalog.resolve(&name).await.map_err(SelectionError::Catalog)? {
            Some(entity) => entity,
            None => {
                log::debug!("Skipping {} - no longer exists", name);
                continue;
            }
        };
        if !entity.has_rows {
            log::debug!("Skipping {} - empty", name);
            continue;
        }
        candidates.push(entity);
    }

    log::info!("Selected {} entity types for export", candidates.len());
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StaticCatalog {
        StaticCatalog::builder()
            .entity("users", 3)
            .entity("posts", 2)
            .entity("drafts", 0)
            .entity("schema_migrations", 4)
            .build()
    }

    #[test]
    fn test_entity_identity_is_name() {
        assert_eq!(EntityType::new("users", true), EntityType::new("users", false));
        assert_ne!(EntityType::new("users", true), EntityType::new("posts", true));
    }

    #[tokio::test]
    async fn test_select_all_filters_system_and_empty() {
        let selected = select_candidates(&catalog(), None).await.unwrap();
        let names: Vec<_> = selected.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["users", "posts"]);
    }

    #[tokio::test]
    async fn test_selector_keeps_requested_order() {
        let selector = vec!["Post".to_string(), " User ".to_string()];
        let selected = select_candidates(&catalog(), Some(selector.as_slice())).await.unwrap();
        let names: Vec<_> = selected.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["posts", "users"]);
    }

    #[tokio::test]
    async fn test_selector_deduplicates() {
        let selector = vec!["users".to_string(), "User".to_string()];
        let selected = select_candidates(&catalog(), Some(selector.as_slice())).await.unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn test_selector_drops_empty_types() {
        let selector = vec!["drafts".to_string(), "users".to_string()];
        let selected = select_candidates(&catalog(), Some(selector.as_slice())).await.unwrap();
        let names: Vec<_> = selected.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["users"]);
    }

    #[tokio::test]
    async fn test_unknown_selector_entry_is_an_error() {
        let selector = vec!["widgets".to_string()];
        let err = select_candidates(&catalog(), Some(selector.as_slice())).await.unwrap_err();
        assert!(matches!(err, SelectionError::UnknownEntity { ref name } if name == "widgets"));
    }
}
