//! In-memory catalog populated once at startup

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use super::{Catalog, EntityType, Reference, naming};

/// Registered type with its row count and declared references
#[derive(Debug, Clone)]
struct Registration {
    row_count: u64,
    references: Vec<Reference>,
}

/// Explicit registry mapping type names to their descriptors
///
/// Registration order is the catalog order reported by `list_types`.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    order: Vec<String>,
    entries: HashMap<String, Registration>,
}

impl StaticCatalog {
    pub fn builder() -> StaticCatalogBuilder {
        StaticCatalogBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_types(&self) -> Result<Vec<EntityType>> {
        Ok(self
            .order
            .iter()
            .map(|name| EntityType::new(name.clone(), self.entries[name].row_count > 0))
            .collect())
    }

    async fn resolve(&self, name: &str) -> Result<Option<EntityType>> {
        Ok(self
            .entries
            .get(name)
            .map(|reg| EntityType::new(name, reg.row_count > 0)))
    }

    async fn has_rows(&self, name: &str) -> Result<bool> {
        Ok(self.entries.get(name).is_some_and(|reg| reg.row_count > 0))
    }

    async fn references(&self, entity: &EntityType) -> Result<Vec<Reference>> {
        Ok(self
            .entries
            .get(&entity.name)
            .map(|reg| reg.references.clone())
            .unwrap_or_default())
    }

    fn is_system(&self, name: &str) -> bool {
        naming::is_system_name(name)
    }
}

/// Builder for [`StaticCatalog`]
#[derive(Debug, Default)]
pub struct StaticCatalogBuilder {
    catalog: StaticCatalog,
}

impl StaticCatalogBuilder {
    /// Register a type; registering the same name again updates its row count
    pub fn entity(mut self, name: &str, row_count: u64) -> Self {
        match self.catalog.entries.get_mut(name) {
            Some(reg) => reg.row_count = row_count,
            None => {
                self.catalog.order.push(name.to_string());
                self.catalog.entries.insert(
                    name.to_string(),
                    Registration {
                        row_count,
                        references: Vec::new(),
                    },
                );
            }
        }
        self
    }

    /// Declare a reference on an already registered type
    ///
    /// The target does not need to be registered; unregistered targets model
    /// references that fail to resolve.
    pub fn reference(mut self, owner: &str, reference: Reference) -> Self {
        if !self.catalog.entries.contains_key(owner) {
            self = self.entity(owner, 0);
        }
        if let Some(reg) = self.catalog.entries.get_mut(owner) {
            reg.references.push(reference);
        }
        self
    }

    pub fn belongs_to(self, owner: &str, field: &str, target: &str) -> Self {
        self.reference(owner, Reference::belongs_to(field, target))
    }

    pub fn build(self) -> StaticCatalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ReferenceKind;

    #[tokio::test]
    async fn test_registration_order_is_catalog_order() {
        let catalog = StaticCatalog::builder()
            .entity("comments", 1)
            .entity("users", 1)
            .entity("posts", 0)
            .build();

        let names: Vec<_> = catalog
            .list_types()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["comments", "users", "posts"]);
    }

    #[tokio::test]
    async fn test_existence_and_rows() {
        let catalog = StaticCatalog::builder()
            .entity("users", 2)
            .entity("drafts", 0)
            .build();

        assert!(catalog.type_exists("users").await.unwrap());
        assert!(catalog.type_exists("drafts").await.unwrap());
        assert!(!catalog.type_exists("ghosts").await.unwrap());
        assert!(catalog.has_rows("users").await.unwrap());
        assert!(!catalog.has_rows("drafts").await.unwrap());
        assert!(!catalog.has_rows("ghosts").await.unwrap());
    }

    #[tokio::test]
    async fn test_references_keep_declaration_order() {
        let catalog = StaticCatalog::builder()
            .entity("users", 1)
            .entity("comments", 1)
            .belongs_to("comments", "post_id", "posts")
            .belongs_to("comments", "author_id", "users")
            .reference(
                "comments",
                Reference {
                    field: "reactions".into(),
                    target: "reactions".into(),
                    kind: ReferenceKind::HasMany,
                },
            )
            .build();

        let refs = catalog
            .references(&EntityType::new("comments", true))
            .await
            .unwrap();
        let fields: Vec<_> = refs.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["post_id", "author_id", "reactions"]);
        assert!(!refs[2].is_belongs_to());
    }

    #[test]
    fn test_re_registering_updates_row_count() {
        let catalog = StaticCatalog::builder()
            .entity("users", 0)
            .entity("users", 5)
            .build();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries["users"].row_count, 5);
    }
}
