//! Cart route handlers, including checkout.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use bluebell_core::{PaymentMethod, PhoneNumber, ProductId};

use crate::db::cart::CartRepository;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::Cart;
use crate::models::order::{Order, ShippingAddress};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct RemoveParams {
    /// When true, remove a single unit instead of the whole line.
    #[serde(default)]
    pub decrement: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
}

/// `GET /api/cart` - resolved cart lines plus subtotal.
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    Ok(Json(cart))
}

/// `POST /api/cart` - add units of a product, incrementing an existing line.
///
/// Stock is deliberately not checked here; only checkout enforces it.
pub async fn add(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    if req.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    repo.add_item(user.id, req.product_id, req.quantity)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    let cart = repo.get(user.id).await?;
    Ok(Json(cart))
}

/// `PUT /api/cart/{productId}` - overwrite a line's quantity.
///
/// A non-positive quantity is a validation error and leaves the line
/// untouched.
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>> {
    if req.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    repo.set_quantity(user.id, product_id, req.quantity)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product is not in the cart".to_string())
            }
            other => AppError::Database(other),
        })?;

    let cart = repo.get(user.id).await?;
    Ok(Json(cart))
}

/// `DELETE /api/cart/{productId}?decrement=true|false`
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<Cart>> {
    let repo = CartRepository::new(state.pool());
    repo.remove_item(user.id, product_id, params.decrement)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product is not in the cart".to_string())
            }
            other => AppError::Database(other),
        })?;

    let cart = repo.get(user.id).await?;
    Ok(Json(cart))
}

/// `POST /api/cart/checkout` - convert the cart into an order.
///
/// All input validation happens before any database write; the conversion
/// itself is one transaction. The receipt email afterwards is best-effort.
pub async fn checkout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    if let Some(field) = req.shipping_address.first_missing_field() {
        return Err(AppError::Validation(format!(
            "All fields in the shipping address are required (missing {field})"
        )));
    }

    let phone = PhoneNumber::parse(req.phone_number.trim())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let order = OrderRepository::new(state.pool())
        .checkout(user.id, &req.shipping_address, &phone, req.payment_method)
        .await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.id,
        total = %order.total_amount,
        "Checkout complete"
    );

    // Best-effort receipt: the order is committed, a mail failure only logs.
    if let Some(mailer) = state.mailer() {
        let mailer = mailer.clone();
        let to = user.email.to_string();
        let receipt_order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_order_receipt(&to, &receipt_order).await {
                tracing::warn!(order_id = %receipt_order.id, "Receipt email failed: {e}");
            }
        });
    }

    Ok((StatusCode::CREATED, Json(order)))
}
