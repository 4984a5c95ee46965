//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use bluebell_core::{Email, UserId};

use crate::config::ServerConfig;
use crate::db::users::UserRepository;
use crate::services::chat::ChatRelay;
use crate::services::email::EmailService;
use crate::services::ocr::OcrClient;

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid BLUEBELL_SUPPORT_EMAIL: {0}")]
    InvalidSupportEmail(String),
    #[error(
        "support identity {0} does not exist; create it with `bluebell seed` \
         or `bluebell admin create`"
    )]
    MissingSupportIdentity(String),
    #[error("support identity {0} must be an admin")]
    SupportNotAdmin(String),
    #[error("database error: {0}")]
    Database(#[from] crate::db::RepositoryError),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    chat_relay: ChatRelay,
    mailer: Option<EmailService>,
    ocr: Option<OcrClient>,
    support_user_id: UserId,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Resolves the shared chat support identity from the database: the
    /// server refuses to start without it, because every customer
    /// conversation needs a counterparty.
    ///
    /// # Errors
    ///
    /// Returns an error if the support identity is missing or not an admin,
    /// or if the SMTP relay cannot be configured.
    pub async fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let support_email = Email::parse(&config.support_email)
            .map_err(|e| StateError::InvalidSupportEmail(e.to_string()))?;

        let support = UserRepository::new(&pool)
            .get_by_email(&support_email)
            .await?
            .ok_or_else(|| StateError::MissingSupportIdentity(config.support_email.clone()))?;

        if !support.is_admin {
            return Err(StateError::SupportNotAdmin(config.support_email.clone()));
        }

        let mailer = match &config.smtp {
            Some(smtp) => Some(EmailService::new(smtp)?),
            None => None,
        };

        let ocr = config.ocr.clone().map(OcrClient::new);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                chat_relay: ChatRelay::new(),
                mailer,
                ocr,
                support_user_id: support.id,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the chat relay hub.
    #[must_use]
    pub fn chat_relay(&self) -> &ChatRelay {
        &self.inner.chat_relay
    }

    /// Get the receipt mailer, if SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }

    /// Get the OCR client, if a provider is configured.
    #[must_use]
    pub fn ocr(&self) -> Option<&OcrClient> {
        self.inner.ocr.as_ref()
    }

    /// The shared chat support identity.
    #[must_use]
    pub fn support_user_id(&self) -> UserId {
        self.inner.support_user_id
    }
}
