//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bluebell_core::CategoryId;

use crate::db::categories::CategoryRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::catalog::{Category, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `GET /api/categories`
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// `GET /api/categories/{id}`
pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(Json(category))
}

/// `POST /api/categories` (admin)
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".to_string()));
    }

    let category = CategoryRepository::new(state.pool())
        .create(req.name.trim(), req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}` (admin)
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .update(id, req.name.as_deref(), req.description.as_deref())
        .await?;
    Ok(Json(category))
}

/// `DELETE /api/categories/{id}` (admin)
///
/// Products in the category survive with a null category reference.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<serde_json::Value>> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Category removed" })))
}

/// `GET /api/categories/{id}/products`
pub async fn products(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Vec<Product>>> {
    let repo = CategoryRepository::new(state.pool());
    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let products = ProductRepository::new(state.pool())
        .list_by_category(id)
        .await?;
    Ok(Json(products))
}
