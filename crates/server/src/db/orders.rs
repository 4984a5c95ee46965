//! Order repository: checkout, lifecycle, cancellation.
//!
//! Checkout and cancellation are the two multi-step writes in the system;
//! each runs inside a single transaction so a partial failure can never
//! leave decremented stock without an order, or an order in both the live
//! and canceled collections.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use bluebell_core::{OrderId, OrderStatus, PaymentMethod, PhoneNumber, Price, ProductId, UserId};

use super::{RepositoryError, cart::CartRepository};
use crate::models::order::{CanceledOrder, Order, OrderItem, ShippingAddress};

/// Errors specific to checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line asks for more units than are in stock.
    #[error("insufficient stock for {product_name}: {available} available, {requested} requested")]
    InsufficientStock {
        product_name: String,
        available: i32,
        requested: i32,
    },

    /// The order total overflowed.
    #[error("order total overflow")]
    TotalOverflow,

    /// The underlying database operation failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Errors specific to cancellation.
#[derive(Debug, Error)]
pub enum CancelError {
    /// No such order.
    #[error("order not found")]
    NotFound,

    /// The caller neither owns the order nor is an admin.
    #[error("not your order")]
    NotOwner,

    /// Delivered orders cannot be cancelled.
    #[error("cannot cancel a delivered order")]
    AlreadyDelivered,

    /// The underlying database operation failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Internal row type for order headers.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    customer_name: Option<String>,
    total_amount: Price,
    status: OrderStatus,
    address: String,
    city: String,
    postal_code: String,
    country: String,
    phone_number: String,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user: self.user_id,
            customer_name: self.customer_name,
            items,
            total_amount: self.total_amount,
            status: self.status,
            shipping_address: ShippingAddress {
                address: self.address,
                city: self.city,
                postal_code: self.postal_code,
                country: self.country,
            },
            phone_number: self.phone_number,
            payment_method: self.payment_method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for canceled-order headers.
#[derive(Debug, sqlx::FromRow)]
struct CanceledOrderRow {
    id: OrderId,
    user_id: UserId,
    customer_name: Option<String>,
    total_amount: Price,
    status: OrderStatus,
    address: String,
    city: String,
    postal_code: String,
    country: String,
    phone_number: String,
    payment_method: PaymentMethod,
    ordered_at: DateTime<Utc>,
    canceled_at: DateTime<Utc>,
}

impl CanceledOrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> CanceledOrder {
        CanceledOrder {
            id: self.id,
            user: self.user_id,
            customer_name: self.customer_name,
            items,
            total_amount: self.total_amount,
            status: self.status,
            shipping_address: ShippingAddress {
                address: self.address,
                city: self.city,
                postal_code: self.postal_code,
                country: self.country,
            },
            phone_number: self.phone_number,
            payment_method: self.payment_method,
            ordered_at: self.ordered_at,
            canceled_at: self.canceled_at,
        }
    }
}

/// Internal row type for order items.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    unit_price: Price,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product: row.product_id,
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
        }
    }
}

/// A locked cart line during checkout.
#[derive(Debug, sqlx::FromRow)]
struct LockedLine {
    product_id: ProductId,
    product_name: String,
    unit_price: Price,
    stock_level: i32,
    quantity: i32,
}

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.total_amount, o.status,
       o.address, o.city, o.postal_code, o.country,
       o.phone_number, o.payment_method, o.created_at, o.updated_at";

const CANCELED_COLUMNS: &str = "o.id, o.user_id, o.total_amount, o.status,
       o.address, o.city, o.postal_code, o.country,
       o.phone_number, o.payment_method, o.ordered_at, o.canceled_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert a user's cart into a committed order.
    ///
    /// One transaction: lock the carted products in a stable order,
    /// conditionally decrement each stock level, insert the order with
    /// name/price snapshots, clear the cart, commit. Any failure rolls the
    /// whole thing back, so no partial decrement survives.
    ///
    /// The total is computed here from the locked rows, not taken from the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to check out,
    /// `CheckoutError::InsufficientStock` naming the first short product,
    /// or `CheckoutError::Database` for query failures.
    pub async fn checkout(
        &self,
        user: UserId,
        shipping_address: &ShippingAddress,
        phone_number: &PhoneNumber,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        // Lock in product-id order so concurrent checkouts cannot deadlock.
        let lines: Vec<LockedLine> = sqlx::query_as(
            "SELECT ci.product_id, p.name AS product_name, p.price AS unit_price,
                    p.stock_level, ci.quantity
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.user_id = $1
             ORDER BY ci.product_id
             FOR UPDATE OF p",
        )
        .bind(user)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut total = Price::ZERO;
        for line in &lines {
            if line.stock_level < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    available: line.stock_level,
                    requested: line.quantity,
                });
            }

            let quantity =
                u32::try_from(line.quantity).map_err(|_| CheckoutError::TotalOverflow)?;
            let line_total = line
                .unit_price
                .line_total(quantity)
                .ok_or(CheckoutError::TotalOverflow)?;
            total = [total, line_total].into_iter().sum();
        }

        for line in &lines {
            // The guard re-checks under the lock; rows_affected 0 here would
            // mean the lock was broken, so treat it as insufficient stock.
            let result = sqlx::query(
                "UPDATE products SET stock_level = stock_level - $2, updated_at = now()
                 WHERE id = $1 AND stock_level >= $2",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CheckoutError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    available: line.stock_level,
                    requested: line.quantity,
                });
            }
        }

        let header: OrderRow = sqlx::query_as(
            "INSERT INTO orders
                 (user_id, total_amount, address, city, postal_code, country,
                  phone_number, payment_method)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, NULL::text AS customer_name, total_amount, status,
                       address, city, postal_code, country, phone_number,
                       payment_method, created_at, updated_at",
        )
        .bind(user)
        .bind(total)
        .bind(&shipping_address.address)
        .bind(&shipping_address.city)
        .bind(&shipping_address.postal_code)
        .bind(&shipping_address.country)
        .bind(phone_number.as_str())
        .bind(payment_method)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items
                     (order_id, product_id, product_name, unit_price, quantity)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(header.id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                product: line.product_id,
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            });
        }

        CartRepository::clear_in_tx(&mut tx, user).await?;
        tx.commit().await?;

        Ok(header.into_order(items))
    }

    /// Cancel an order: snapshot it into the canceled collection and delete
    /// the original, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `CancelError::NotFound` for an unknown order,
    /// `CancelError::NotOwner` when a non-admin cancels someone else's
    /// order, and `CancelError::AlreadyDelivered` for delivered orders.
    pub async fn cancel(
        &self,
        order: OrderId,
        requester: UserId,
        requester_is_admin: bool,
    ) -> Result<CanceledOrder, CancelError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}, NULL::text AS customer_name
             FROM orders o WHERE o.id = $1 FOR UPDATE"
        ))
        .bind(order)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(CancelError::NotFound);
        };

        if !requester_is_admin && row.user_id != requester {
            return Err(CancelError::NotOwner);
        }

        if row.status == OrderStatus::Delivered {
            return Err(CancelError::AlreadyDelivered);
        }

        let snapshot: CanceledOrderRow = sqlx::query_as(
            "INSERT INTO canceled_orders
                 (id, user_id, total_amount, address, city, postal_code,
                  country, phone_number, payment_method, ordered_at)
             SELECT id, user_id, total_amount, address, city, postal_code,
                    country, phone_number, payment_method, created_at
             FROM orders WHERE id = $1
             RETURNING id, user_id, NULL::text AS customer_name, total_amount, status,
                       address, city, postal_code, country, phone_number,
                       payment_method, ordered_at, canceled_at",
        )
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO canceled_order_items
                 (id, canceled_order_id, product_id, product_name, unit_price, quantity)
             SELECT id, order_id, product_id, product_name, unit_price, quantity
             FROM order_items WHERE order_id = $1",
        )
        .bind(order)
        .execute(&mut *tx)
        .await?;

        let items: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT canceled_order_id AS order_id, product_id, product_name,
                    unit_price, quantity
             FROM canceled_order_items WHERE canceled_order_id = $1",
        )
        .bind(order)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(snapshot.into_order(items.into_iter().map(Into::into).collect()))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}, NULL::text AS customer_name
             FROM orders o WHERE o.user_id = $1 ORDER BY o.created_at DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        self.assemble_orders(rows).await
    }

    /// All orders with customer display names, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}, u.display_name AS customer_name
             FROM orders o JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble_orders(rows).await
    }

    /// Overwrite an order's status (admin route).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING id, user_id, NULL::text AS customer_name, total_amount, status,
                       address, city, postal_code, country, phone_number,
                       payment_method, created_at, updated_at",
        )
        .bind(order)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };

        let items = self.items_for(&[row.id]).await?;
        let order_items = items.get(&row.id).cloned().unwrap_or_default();
        Ok(row.into_order(order_items))
    }

    /// A user's canceled orders, newest cancellation first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_canceled_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<CanceledOrder>, RepositoryError> {
        let rows: Vec<CanceledOrderRow> = sqlx::query_as(&format!(
            "SELECT {CANCELED_COLUMNS}, NULL::text AS customer_name
             FROM canceled_orders o WHERE o.user_id = $1
             ORDER BY o.canceled_at DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        self.assemble_canceled(rows).await
    }

    /// All canceled orders with customer display names (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_canceled_all(&self) -> Result<Vec<CanceledOrder>, RepositoryError> {
        let rows: Vec<CanceledOrderRow> = sqlx::query_as(&format!(
            "SELECT {CANCELED_COLUMNS}, u.display_name AS customer_name
             FROM canceled_orders o JOIN users u ON u.id = o.user_id
             ORDER BY o.canceled_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble_canceled(rows).await
    }

    /// Fetch items for a set of orders, grouped by order id.
    async fn items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i32> = order_ids.iter().map(|id| id.as_i32()).collect();
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, product_name, unit_price, quantity
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Fetch items for a set of canceled orders, grouped by order id.
    async fn canceled_items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i32> = order_ids.iter().map(|id| id.as_i32()).collect();
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT canceled_order_id AS order_id, product_id, product_name,
                    unit_price, quantity
             FROM canceled_order_items WHERE canceled_order_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn assemble_orders(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }

    async fn assemble_canceled(
        &self,
        rows: Vec<CanceledOrderRow>,
    ) -> Result<Vec<CanceledOrder>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items = self.canceled_items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }
}
