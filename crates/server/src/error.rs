//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding. All route handlers return
//! `Result<T, AppError>`; every error leaves the boundary as a JSON body of
//! the shape `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::orders::{CancelError, CheckoutError};
use crate::services::auth::AuthError;
use crate::services::chat::ChatSendError;
use crate::services::ocr::OcrError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order cancellation failed.
    #[error("Cancel error: {0}")]
    Cancel(#[from] CancelError),

    /// Chat send failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatSendError),

    /// OCR provider failed.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the server's fault (captured to Sentry,
    /// details hidden from the client).
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::TokenIssue(_) | AuthError::Hashing)
                | Self::Checkout(CheckoutError::Database(_) | CheckoutError::TotalOverflow)
                | Self::Cancel(CancelError::Database(_))
                | Self::Chat(ChatSendError::Repository(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::TokenIssue(_) | AuthError::Hashing | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
                CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CheckoutError::TotalOverflow | CheckoutError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cancel(err) => match err {
                CancelError::NotFound => StatusCode::NOT_FOUND,
                CancelError::NotOwner => StatusCode::FORBIDDEN,
                CancelError::AlreadyDelivered => StatusCode::CONFLICT,
                CancelError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Chat(err) => match err {
                ChatSendError::EmptyMessage
                | ChatSendError::MissingRecipient
                | ChatSendError::RecipientNotCustomer => StatusCode::BAD_REQUEST,
                ChatSendError::RecipientNotFound => StatusCode::NOT_FOUND,
                ChatSendError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Ocr(err) => match err {
                OcrError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                OcrError::Http(_) | OcrError::Status(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to the client. Server-side details stay in the
    /// logs.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::InvalidToken => "Not authorized, token failed".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => e.to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Checkout(err) => err.to_string(),
            Self::Cancel(err) => err.to_string(),
            Self::Chat(err) => err.to_string(),
            Self::Ocr(err) => match err {
                OcrError::NotConfigured => "Prescription scanning is not available".to_string(),
                _ => "Error processing the image for OCR".to_string(),
            },
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "message": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_basic_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("product".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("not an admin".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Validation("bad quantity".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_statuses() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InsufficientStock {
                product_name: "Ibuprofen".to_string(),
                available: 1,
                requested: 3,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_cancel_error_statuses() {
        assert_eq!(
            get_status(AppError::Cancel(CancelError::AlreadyDelivered)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Cancel(CancelError::NotOwner)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Cancel(CancelError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "product already exists".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("secret connection string".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_insufficient_stock_message_names_product() {
        let err = AppError::Checkout(CheckoutError::InsufficientStock {
            product_name: "Ibuprofen 200mg".to_string(),
            available: 1,
            requested: 3,
        });
        assert!(err.client_message().contains("Ibuprofen 200mg"));
    }
}
