//! Cart repository.
//!
//! Cart lines live in their own table keyed by (user, product); every
//! mutation is a single atomic statement, so concurrent requests from the
//! same user cannot lose updates. Stock is only checked at checkout, never
//! here.

use sqlx::{PgPool, Postgres, Transaction};

use bluebell_core::{Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

/// Internal row type for resolved cart lines.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    name: String,
    price: Price,
    images: Vec<String>,
    quantity: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative cart quantity for product {}",
                row.product_id
            ))
        })?;
        let line_total = row.price.line_total(quantity).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "cart line total overflow for product {}",
                row.product_id
            ))
        })?;

        Ok(Self {
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            images: row.images,
            quantity: row.quantity,
            line_total,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart with product details resolved, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user: UserId) -> Result<Cart, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            "SELECT ci.product_id, p.name, p.price, p.images, ci.quantity
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.added_at ASC",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::from_lines(items))
    }

    /// Add `quantity` units of a product, incrementing an existing line.
    ///
    /// A single upsert statement: concurrent adds both land.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
            .bind(product)
            .fetch_optional(self.pool)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(user)
        .bind(product)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(|e| {
            // The product can vanish between the existence check and the
            // upsert; surface that as not-found, not a server error.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Overwrite a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn set_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user)
        .bind(product)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a line, or decrement it by one unit (deleting at zero).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn remove_item(
        &self,
        user: UserId,
        product: ProductId,
        decrement_only: bool,
    ) -> Result<(), RepositoryError> {
        let result = if decrement_only {
            // Decrement, then sweep the line if it hit zero. The CHECK
            // constraint forbids storing zero, hence the two statements.
            let updated = sqlx::query(
                "UPDATE cart_items SET quantity = quantity - 1
                 WHERE user_id = $1 AND product_id = $2 AND quantity > 1",
            )
            .bind(user)
            .bind(product)
            .execute(self.pool)
            .await?;

            if updated.rows_affected() > 0 {
                return Ok(());
            }

            sqlx::query(
                "DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2",
            )
            .bind(user)
            .bind(product)
            .execute(self.pool)
            .await?
        } else {
            sqlx::query(
                "DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2",
            )
            .bind(user)
            .bind(product)
            .execute(self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Clear a user's cart inside an existing transaction (checkout).
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the statement fails.
    pub async fn clear_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
