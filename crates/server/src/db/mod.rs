//! Database operations for the Bluebell `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Customers and admins (the chat support identity is a row here)
//! - `categories` / `manufacturers` / `products` / `product_reviews` - Catalog
//! - `cart_items` - Per-user cart lines
//! - `orders` / `order_items` - Committed orders with snapshot pricing
//! - `canceled_orders` / `canceled_order_items` - Cancellation snapshots
//! - `chat_messages` - Support-chat messages
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bluebell-cli -- migrate
//! ```
//! The server never migrates at startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart;
pub mod categories;
pub mod chat;
pub mod manufacturers;
pub mod orders;
pub mod products;
pub mod users;

/// Errors produced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or state constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A row holds data that no longer parses as its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique violation, otherwise
/// pass it through as `Database`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a sqlx error to `Conflict` when it is a foreign-key violation,
/// otherwise pass it through as `Database`.
fn conflict_on_fk(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
