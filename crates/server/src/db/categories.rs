//! Category repository.

use sqlx::PgPool;

use bluebell_core::CategoryId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::catalog::Category;

/// Internal row type for category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO categories (name, description)
             VALUES ($1, $2)
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category already exists"))?;

        Ok(row.into())
    }

    /// Update a category's fields; absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name already exists.
    pub async fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "UPDATE categories
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description)
             WHERE id = $1
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Products referencing it keep existing with a null
    /// category (the reference is optional).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
