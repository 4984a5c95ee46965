//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] bluebell_server::db::RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] bluebell_server::services::auth::AuthError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] bluebell_core::EmailError),
}

/// Connect to the database named by `BLUEBELL_DATABASE_URL` (or the generic
/// `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("BLUEBELL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("BLUEBELL_DATABASE_URL"))?;

    let pool = bluebell_server::db::create_pool(&SecretString::from(url)).await?;
    Ok(pool)
}
