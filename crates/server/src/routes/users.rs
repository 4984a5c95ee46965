//! User route handlers.

use axum::{Json, extract::State};

use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::user::User;
use crate::state::AppState;

/// `GET /api/users/user-info` - the authenticated user's own record.
pub async fn user_info(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

/// `GET /api/users` - all users (admin).
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}
