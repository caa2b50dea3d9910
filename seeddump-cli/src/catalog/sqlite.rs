//! SQLite-backed catalog

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::{Catalog, EntityType, Reference, ReferenceKind, naming};

/// Reflects tables and foreign keys of a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a catalog for a `sqlite:` URL
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .with_context(|| format!("Failed to open database: {}", url))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tables")?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.try_get("name")?);
        }
        Ok(names)
    }

    /// Catalog spelling of `name`, matched case-insensitively like SQLite does
    async fn canonical_name(&self, name: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to look up table {}", name))?;

        match row {
            Some(row) => Ok(Some(row.try_get("name")?)),
            None => Ok(None),
        }
    }
}

/// Double-quote an identifier for interpolation into SQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn list_types(&self) -> Result<Vec<EntityType>> {
        let mut types = Vec::new();
        for name in self.table_names().await? {
            let has_rows = self.has_rows(&name).await?;
            types.push(EntityType::new(name, has_rows));
        }
        Ok(types)
    }

    async fn resolve(&self, name: &str) -> Result<Option<EntityType>> {
        match self.canonical_name(name).await? {
            Some(canonical) => {
                let has_rows = self.has_rows(&canonical).await?;
                Ok(Some(EntityType::new(canonical, has_rows)))
            }
            None => Ok(None),
        }
    }

    async fn has_rows(&self, name: &str) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {}) AS present", quote_ident(name));
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to check rows of {}", name))?;
        let present: i64 = row.try_get("present")?;
        Ok(present != 0)
    }

    async fn references(&self, entity: &EntityType) -> Result<Vec<Reference>> {
        let rows = sqlx::query(
            r#"SELECT "id", "seq", "table", "from" FROM pragma_foreign_key_list(?) ORDER BY "id", "seq""#,
        )
        .bind(&entity.name)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to read foreign keys of {}", entity.name))?;

        // Composite keys arrive as several rows sharing an id
        let mut references: Vec<(i64, Reference)> = Vec::new();
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let target: String = row.try_get("table")?;
            let column: String = row.try_get("from")?;

            match references.last_mut() {
                Some((last_id, reference)) if *last_id == id => {
                    reference.field.push(',');
                    reference.field.push_str(&column);
                }
                _ => references.push((
                    id,
                    Reference {
                        field: column,
                        target,
                        kind: ReferenceKind::BelongsTo,
                    },
                )),
            }
        }

        // SQLite lists foreign keys last-declared first
        references.sort_by_key(|(id, _)| std::cmp::Reverse(*id));
        Ok(references.into_iter().map(|(_, r)| r).collect())
    }

    fn is_system(&self, name: &str) -> bool {
        naming::is_system_name(name)
    }
}
