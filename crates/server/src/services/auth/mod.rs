//! Authentication service.
//!
//! Password hashing with argon2 and stateless bearer tokens (HS256 JWT).
//! Every authenticated request re-fetches the user row, so an admin-flag
//! change takes effect on the next request rather than at token expiry.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use bluebell_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i32,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Authentication service.
///
/// Handles registration, login, and bearer-token issuance/verification.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt_secret: &'a SecretString,
    token_ttl_hours: i64,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt_secret: &'a SecretString, token_ttl_hours: i64) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt_secret,
            token_ttl_hours,
        }
    }

    /// Register a new customer account and issue a token for it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword` if the password doesn't meet requirements,
    /// and `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, display_name, &password_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Login with email and password, issuing a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Sign a bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue_token(&self, user: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.as_i32(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_ttl_hours)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )?;
        Ok(token)
    }

    /// Verify a bearer token and load its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad/expired token or a user
    /// that no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = decode_token(token, self.jwt_secret)?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

/// Decode and validate a bearer token, returning the subject user id.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is malformed, has a bad
/// signature, or is expired.
pub fn decode_token(token: &str, jwt_secret: &SecretString) -> Result<UserId, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    Ok(UserId::new(data.claims.sub))
}

/// Hash a password with argon2id and a random salt.
///
/// Public so the CLI can create accounts with the same hashing scheme.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Hashing)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Enforce the password policy.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kJ8#mP2$vN5@qR9!wT3&yU6*zA1^bC4d")
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_password_rejects_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = secret();
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let user = decode_token(&token, &secret).unwrap();
        assert_eq!(user, UserId::new(42));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let secret = secret();
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&token, &secret),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"one secret value, thirty-two chars"),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&token, &secret()),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            decode_token("not-a-token", &secret()),
            Err(AuthError::InvalidToken)
        ));
    }
}
