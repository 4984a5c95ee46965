//! Product repository: catalog queries, stock, and reviews.
//!
//! Review aggregates (`average_rating`, `ratings_count`) are denormalized
//! onto the product row and recomputed inside the same transaction as every
//! review insert or delete.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use bluebell_core::{CategoryId, ManufacturerId, Price, ProductId, ReviewId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::catalog::{Product, Review};

/// Internal row type for product queries (category/manufacturer names joined).
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    manufacturer_id: ManufacturerId,
    manufacturer_name: String,
    price: Price,
    description: Option<String>,
    stock_level: i32,
    images: Vec<String>,
    average_rating: f64,
    ratings_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category_id,
            category_name: row.category_name,
            manufacturer: row.manufacturer_id,
            manufacturer_name: row.manufacturer_name,
            price: row.price,
            description: row.description,
            stock_level: row.stock_level,
            images: row.images,
            average_rating: row.average_rating,
            ratings_count: row.ratings_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    author_name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            author_name: row.author_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_SELECT: &str = "
    SELECT p.id, p.name, p.category_id, c.name AS category_name,
           p.manufacturer_id, m.name AS manufacturer_name,
           p.price, p.description, p.stock_level, p.images,
           p.average_rating, p.ratings_count, p.created_at, p.updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
    JOIN manufacturers m ON m.id = p.manufacturer_id";

/// Fields accepted by [`ProductRepository::create`].
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub category: Option<CategoryId>,
    pub manufacturer: ManufacturerId,
    pub price: Price,
    pub description: Option<&'a str>,
    pub stock_level: i32,
    pub images: &'a [String],
}

/// Patch accepted by [`ProductRepository::update`]; absent fields keep their
/// current value.
#[derive(Debug, Default)]
pub struct ProductPatch<'a> {
    pub name: Option<&'a str>,
    pub category: Option<CategoryId>,
    pub manufacturer: Option<ManufacturerId>,
    pub price: Option<Price>,
    pub description: Option<&'a str>,
    pub stock_level: Option<i32>,
    pub images: Option<&'a [String]>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, alphabetical, with category and manufacturer names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{PRODUCT_SELECT} ORDER BY p.name"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} WHERE p.category_id = $1 ORDER BY p.name"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List products from a manufacturer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_manufacturer(
        &self,
        manufacturer: ManufacturerId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} WHERE p.manufacturer_id = $1 ORDER BY p.name"
        ))
        .bind(manufacturer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive substring search on product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(term));
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} WHERE p.name ILIKE $1 ORDER BY p.name"
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Products whose name matches any of the given keywords.
    ///
    /// Used by the prescription-scanning flow: the keywords come from OCR
    /// text, so an empty list returns an empty result rather than the whole
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_by_keywords(
        &self,
        keywords: &[String],
    ) -> Result<Vec<Product>, RepositoryError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let patterns: Vec<String> = keywords
            .iter()
            .map(|k| format!("%{}%", escape_like(k)))
            .collect();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} WHERE p.name ILIKE ANY($1) ORDER BY p.name"
        ))
        .bind(patterns)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, new: NewProduct<'_>) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO products
                 (name, category_id, manufacturer_id, price, description, stock_level, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(new.name)
        .bind(new.category)
        .bind(new.manufacturer)
        .bind(new.price)
        .bind(new.description)
        .bind(new.stock_level)
        .bind(new.images)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product already exists"))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Update a product; absent patch fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name already exists.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch<'_>,
    ) -> Result<Product, RepositoryError> {
        let updated: Option<ProductId> = sqlx::query_scalar(
            "UPDATE products
             SET name = COALESCE($2, name),
                 category_id = COALESCE($3, category_id),
                 manufacturer_id = COALESCE($4, manufacturer_id),
                 price = COALESCE($5, price),
                 description = COALESCE($6, description),
                 stock_level = COALESCE($7, stock_level),
                 images = COALESCE($8, images),
                 updated_at = now()
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.category)
        .bind(patch.manufacturer)
        .bind(patch.price)
        .bind(patch.description)
        .bind(patch.stock_level)
        .bind(patch.images)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product already exists"))?;

        match updated {
            Some(id) => self.get(id).await?.ok_or(RepositoryError::NotFound),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List a product's reviews, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_reviews(&self, product: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT id, author_name, rating, comment, created_at
             FROM product_reviews
             WHERE product_id = $1
             ORDER BY created_at ASC",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a review and recompute the product's rating aggregates, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add_review(
        &self,
        product: ProductId,
        author_name: &str,
        rating: i16,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
            .bind(product)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let row: ReviewRow = sqlx::query_as(
            "INSERT INTO product_reviews (product_id, author_name, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id, author_name, rating, comment, created_at",
        )
        .bind(product)
        .bind(author_name)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        refresh_rating_aggregates(&mut tx, product).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete a review and recompute the product's rating aggregates, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist on
    /// that product.
    pub async fn delete_review(
        &self,
        product: ProductId,
        review: ReviewId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM product_reviews WHERE id = $1 AND product_id = $2",
        )
        .bind(review)
        .bind(product)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        refresh_rating_aggregates(&mut tx, product).await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Recompute `average_rating` and `ratings_count` from the review rows.
///
/// `COALESCE(AVG(...), 0)` resets the average when the last review goes,
/// with no division by zero.
async fn refresh_rating_aggregates(
    tx: &mut Transaction<'_, Postgres>,
    product: ProductId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products p
         SET average_rating = agg.avg_rating,
             ratings_count = agg.count,
             updated_at = now()
         FROM (
             SELECT COALESCE(AVG(rating)::float8, 0) AS avg_rating,
                    COUNT(*)::int AS count
             FROM product_reviews
             WHERE product_id = $1
         ) agg
         WHERE p.id = $1",
    )
    .bind(product)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Escape LIKE wildcards in user-supplied search input.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_passes_plain_terms() {
        assert_eq!(escape_like("ibuprofen"), "ibuprofen");
    }

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
