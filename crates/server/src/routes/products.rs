//! Product route handlers: catalog CRUD, search, reviews, prescription scan.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use bluebell_core::{CategoryId, ManufacturerId, Price, ProductId, ReviewId};

use crate::db::products::{NewProduct, ProductPatch, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::catalog::{Product, Review};
use crate::services::ocr::{OcrError, extract_keywords};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub manufacturer: ManufacturerId,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "stock_level")]
    pub stock_level: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<CategoryId>,
    pub manufacturer: Option<ManufacturerId>,
    pub price: Option<Price>,
    pub description: Option<String>,
    #[serde(rename = "stock_level")]
    pub stock_level: Option<i32>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Base64-encoded image bytes.
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// The text the provider read off the image.
    pub text: String,
    /// Catalog matches for the extracted keywords.
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    pub name: String,
    pub rating: i16,
    pub comment: String,
}

/// A product with its reviews, for the detail view.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// `GET /api/products`
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}`
pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    let reviews = repo.list_reviews(id).await?;

    Ok(Json(ProductDetail { product, reviews }))
}

/// `POST /api/products` (admin)
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if req.stock_level < 0 {
        return Err(AppError::Validation(
            "stock_level cannot be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            name: req.name.trim(),
            category: req.category,
            manufacturer: req.manufacturer,
            price: req.price,
            description: req.description.as_deref(),
            stock_level: req.stock_level,
            images: &req.images,
        })
        .await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}` (admin) - patches only the provided fields.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if let Some(level) = req.stock_level
        && level < 0
    {
        return Err(AppError::Validation(
            "stock_level cannot be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .update(
            id,
            ProductPatch {
                name: req.name.as_deref(),
                category: req.category,
                manufacturer: req.manufacturer,
                price: req.price,
                description: req.description.as_deref(),
                stock_level: req.stock_level,
                images: req.images.as_deref(),
            },
        )
        .await?;

    Ok(Json(product))
}

/// `DELETE /api/products/{id}` (admin)
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Product removed" })))
}

/// `GET /api/products/search?q=term`
pub async fn search(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>> {
    let term = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?;

    let products = ProductRepository::new(state.pool())
        .search_by_name(term)
        .await?;
    Ok(Json(products))
}

/// `POST /api/products/searchOCR` - prescription scan.
///
/// Forwards the image to the OCR provider, then searches the catalog for
/// the extracted keywords.
pub async fn search_ocr(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResponse>> {
    let ocr = state.ocr().ok_or(AppError::Ocr(OcrError::NotConfigured))?;

    let image = BASE64
        .decode(req.image.as_bytes())
        .map_err(|_| AppError::Validation("image must be base64".to_string()))?;

    let text = ocr.extract_text(&image).await.map_err(AppError::Ocr)?;
    let keywords = extract_keywords(&text);

    let products = ProductRepository::new(state.pool())
        .search_by_keywords(&keywords)
        .await?;

    tracing::debug!(
        keywords = keywords.len(),
        matches = products.len(),
        "Prescription scan search"
    );
    Ok(Json(ScanResponse { text, products }))
}

/// `POST /api/products/{id}/reviews`
pub async fn add_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(req): Json<AddReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    if req.comment.trim().is_empty() {
        return Err(AppError::Validation("comment is required".to_string()));
    }

    let author = if req.name.trim().is_empty() {
        user.display_name.clone()
    } else {
        req.name.trim().to_string()
    };

    let review = ProductRepository::new(state.pool())
        .add_review(id, &author, req.rating, req.comment.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// `DELETE /api/products/{id}/reviews/{reviewId}`
pub async fn delete_review(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path((id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<Json<serde_json::Value>> {
    ProductRepository::new(state.pool())
        .delete_review(id, review_id)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Review removed" })))
}
