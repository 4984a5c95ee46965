//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bluebell migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BLUEBELL_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)
//!
//! Migration files live in `crates/server/migrations/` and are embedded
//! into this binary at compile time.

use super::CommandError;

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
