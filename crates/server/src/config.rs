//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLUEBELL_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   the generic `DATABASE_URL`)
//! - `BLUEBELL_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BLUEBELL_HOST` - Bind address (default: 127.0.0.1)
//! - `BLUEBELL_PORT` - Listen port (default: 4000)
//! - `BLUEBELL_CORS_ORIGIN` - Allowed browser origin (default: http://localhost:3000)
//! - `BLUEBELL_TOKEN_TTL_HOURS` - Bearer token lifetime (default: 24)
//! - `BLUEBELL_SUPPORT_EMAIL` - Email of the shared support identity used by
//!   the chat relay (default: support@bluebellpharmacy.example)
//! - `BLUEBELL_OCR_URL` / `BLUEBELL_OCR_API_KEY` - Image-to-text provider;
//!   prescription scanning is disabled when unset
//! - `BLUEBELL_SMTP_HOST` / `BLUEBELL_SMTP_PORT` / `BLUEBELL_SMTP_USERNAME` /
//!   `BLUEBELL_SMTP_PASSWORD` / `BLUEBELL_SMTP_FROM` - Receipt email delivery;
//!   receipts are disabled when unset
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origin allowed by CORS (the SPA's origin)
    pub cors_origin: String,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    /// Bearer token lifetime in hours
    pub token_ttl_hours: i64,
    /// Email of the shared support identity for the chat relay
    pub support_email: String,
    /// OCR provider configuration (prescription scanning)
    pub ocr: Option<OcrConfig>,
    /// SMTP configuration (receipt emails)
    pub smtp: Option<SmtpConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// Image-to-text provider configuration.
///
/// The provider is opaque: an HTTPS endpoint that accepts a base64 image and
/// returns extracted text.
#[derive(Clone)]
pub struct OcrConfig {
    /// Provider endpoint URL
    pub url: String,
    /// Provider API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// SMTP configuration for outbound receipt emails.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the JWT secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BLUEBELL_DATABASE_URL")?;
        let host = get_env_or_default("BLUEBELL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BLUEBELL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BLUEBELL_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BLUEBELL_PORT".to_string(), e.to_string()))?;
        let cors_origin = get_env_or_default("BLUEBELL_CORS_ORIGIN", "http://localhost:3000");
        let jwt_secret = get_validated_secret("BLUEBELL_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "BLUEBELL_JWT_SECRET")?;
        let token_ttl_hours = get_env_or_default("BLUEBELL_TOKEN_TTL_HOURS", "24")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BLUEBELL_TOKEN_TTL_HOURS".to_string(), e.to_string())
            })?;
        let support_email = get_env_or_default(
            "BLUEBELL_SUPPORT_EMAIL",
            "support@bluebellpharmacy.example",
        );

        let ocr = OcrConfig::from_env();
        let smtp = SmtpConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            cors_origin,
            jwt_secret,
            token_ttl_hours,
            support_email,
            ocr,
            smtp,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OcrConfig {
    /// Present only when both `BLUEBELL_OCR_URL` and `BLUEBELL_OCR_API_KEY`
    /// are set.
    fn from_env() -> Option<Self> {
        let url = get_optional_env("BLUEBELL_OCR_URL")?;
        let api_key = get_optional_env("BLUEBELL_OCR_API_KEY")?;
        Some(Self {
            url,
            api_key: SecretString::from(api_key),
        })
    }
}

impl SmtpConfig {
    /// Present only when `BLUEBELL_SMTP_HOST` is set; the remaining SMTP
    /// variables are then required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("BLUEBELL_SMTP_HOST") else {
            return Ok(None);
        };

        let port = get_env_or_default("BLUEBELL_SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BLUEBELL_SMTP_PORT".to_string(), e.to_string())
            })?;
        let username = get_required_env("BLUEBELL_SMTP_USERNAME")?;
        let password = SecretString::from(get_required_env("BLUEBELL_SMTP_PASSWORD")?);
        let from_address = get_required_env("BLUEBELL_SMTP_FROM")?;

        Ok(Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
