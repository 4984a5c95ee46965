//! Manufacturer route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bluebell_core::ManufacturerId;

use crate::db::manufacturers::ManufacturerRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::catalog::{Manufacturer, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateManufacturerRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateManufacturerRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// `GET /api/manufacturers`
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Manufacturer>>> {
    let manufacturers = ManufacturerRepository::new(state.pool()).list().await?;
    Ok(Json(manufacturers))
}

/// `GET /api/manufacturers/{id}`
pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ManufacturerId>,
) -> Result<Json<Manufacturer>> {
    let manufacturer = ManufacturerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Manufacturer not found".to_string()))?;
    Ok(Json(manufacturer))
}

/// `POST /api/manufacturers` (admin)
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<CreateManufacturerRequest>,
) -> Result<(StatusCode, Json<Manufacturer>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Manufacturer name is required".to_string(),
        ));
    }

    let manufacturer = ManufacturerRepository::new(state.pool())
        .create(
            req.name.trim(),
            req.description.as_deref(),
            req.image.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(manufacturer)))
}

/// `PUT /api/manufacturers/{id}` (admin)
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ManufacturerId>,
    Json(req): Json<UpdateManufacturerRequest>,
) -> Result<Json<Manufacturer>> {
    let manufacturer = ManufacturerRepository::new(state.pool())
        .update(
            id,
            req.name.as_deref(),
            req.description.as_deref(),
            req.image.as_deref(),
        )
        .await?;
    Ok(Json(manufacturer))
}

/// `DELETE /api/manufacturers/{id}` (admin)
///
/// Refused with a conflict while products still reference the manufacturer.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ManufacturerId>,
) -> Result<Json<serde_json::Value>> {
    ManufacturerRepository::new(state.pool()).delete(id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Manufacturer removed" }),
    ))
}

/// `GET /api/manufacturers/{id}/products`
pub async fn products(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ManufacturerId>,
) -> Result<Json<Vec<Product>>> {
    let repo = ManufacturerRepository::new(state.pool());
    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound("Manufacturer not found".to_string()));
    }

    let products = ProductRepository::new(state.pool())
        .list_by_manufacturer(id)
        .await?;
    Ok(Json(products))
}
