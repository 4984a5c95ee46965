//! Auth route handlers: register and login.

use axum::{Json, extract::State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the user it belongs to; the SPA stores both.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = auth_service(&state);
    let (user, token) = auth
        .register(req.display_name.trim(), &req.email, &req.password)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = auth_service(&state);
    let (user, token) = auth.login(&req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse { token, user }))
}

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(
        state.pool(),
        &state.config().jwt_secret,
        state.config().token_ttl_hours,
    )
}
