//! Authentication error types.

use thiserror::Error;

use bluebell_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password doesn't meet the policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email address failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The bearer token is missing, malformed, expired, or its user is gone.
    #[error("invalid token")]
    InvalidToken,

    /// Signing a new token failed.
    #[error("failed to issue token")]
    TokenIssue(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("password hashing failed")]
    Hashing,

    /// Database operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
