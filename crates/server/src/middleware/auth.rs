//! Authentication extractors.
//!
//! Every request carries (or doesn't) a `Authorization: Bearer <token>`
//! header. The extractors decode the token and re-fetch the user row, so
//! the admin flag is always current; admin routes simply swap `RequireAuth`
//! for `RequireAdmin` in the handler signature.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Extractor that additionally requires the admin flag.
pub struct RequireAdmin(pub User);

/// Error returned when authentication or authorization fails.
pub enum AuthRejection {
    /// No usable `Authorization: Bearer` header.
    MissingToken,
    /// The token didn't verify, or its user is gone.
    InvalidToken,
    /// Authenticated, but not an admin.
    NotAdmin,
    /// The user lookup failed.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Not authorized, no token"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Not authorized, token failed"),
            Self::NotAdmin => (StatusCode::FORBIDDEN, "Not authorized as an admin"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Resolve the current user from the request's bearer token.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AuthRejection> {
    let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

    let auth = AuthService::new(
        state.pool(),
        &state.config().jwt_secret,
        state.config().token_ttl_hours,
    );

    auth.authenticate(token).await.map_err(|e| match e {
        crate::services::auth::AuthError::InvalidToken => AuthRejection::InvalidToken,
        _ => AuthRejection::Internal,
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(AuthRejection::NotAdmin);
        }
        Ok(Self(user))
    }
}
