//! Manufacturer repository.

use sqlx::PgPool;

use bluebell_core::ManufacturerId;

use super::{RepositoryError, conflict_on_fk, conflict_on_unique};
use crate::models::catalog::Manufacturer;

/// Internal row type for manufacturer queries.
#[derive(Debug, sqlx::FromRow)]
struct ManufacturerRow {
    id: ManufacturerId,
    name: String,
    description: Option<String>,
    image: Option<String>,
}

impl From<ManufacturerRow> for Manufacturer {
    fn from(row: ManufacturerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
        }
    }
}

/// Repository for manufacturer database operations.
pub struct ManufacturerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ManufacturerRepository<'a> {
    /// Create a new manufacturer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all manufacturers, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Manufacturer>, RepositoryError> {
        let rows: Vec<ManufacturerRow> =
            sqlx::query_as("SELECT id, name, description, image FROM manufacturers ORDER BY name")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a manufacturer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ManufacturerId) -> Result<Option<Manufacturer>, RepositoryError> {
        let row: Option<ManufacturerRow> =
            sqlx::query_as("SELECT id, name, description, image FROM manufacturers WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new manufacturer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        image: Option<&str>,
    ) -> Result<Manufacturer, RepositoryError> {
        let row: ManufacturerRow = sqlx::query_as(
            "INSERT INTO manufacturers (name, description, image)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, image",
        )
        .bind(name)
        .bind(description)
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "manufacturer already exists"))?;

        Ok(row.into())
    }

    /// Update a manufacturer's fields; absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the manufacturer doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name already exists.
    pub async fn update(
        &self,
        id: ManufacturerId,
        name: Option<&str>,
        description: Option<&str>,
        image: Option<&str>,
    ) -> Result<Manufacturer, RepositoryError> {
        let row: Option<ManufacturerRow> = sqlx::query_as(
            "UPDATE manufacturers
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 image = COALESCE($4, image)
             WHERE id = $1
             RETURNING id, name, description, image",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(image)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "manufacturer already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a manufacturer. Refused while products still reference it:
    /// the product->manufacturer reference is required.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the manufacturer doesn't exist.
    /// Returns `RepositoryError::Conflict` if products still reference it.
    pub async fn delete(&self, id: ManufacturerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM manufacturers WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_fk(e, "manufacturer still has products"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
