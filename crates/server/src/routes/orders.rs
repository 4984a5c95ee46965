//! Order route handlers: listings, status updates, cancellation.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use bluebell_core::{OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::order::{CanceledOrder, Order};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// `GET /api/orders` - the caller's orders, newest first.
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/orders/all` (admin) - every order, with customer names.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// `PUT /api/orders/{id}/status` (admin)
///
/// Overwrites the status unconditionally between the live states; the
/// delivered-is-terminal rule is enforced at cancellation, not here.
/// `Canceled` only exists on snapshots and cannot be set.
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    if req.status == OrderStatus::Canceled {
        return Err(AppError::Validation(
            "use DELETE /api/orders/{id} to cancel an order".to_string(),
        ));
    }

    let order = OrderRepository::new(state.pool())
        .update_status(id, req.status)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Order not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}

/// `DELETE /api/orders/{id}` - cancel an order.
///
/// Owners and admins only; delivered orders conflict. The move into the
/// canceled collection and the delete are one transaction.
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<CanceledOrder>> {
    let canceled = OrderRepository::new(state.pool())
        .cancel(id, user.id, user.is_admin)
        .await?;

    tracing::info!(order_id = %canceled.id, user_id = %user.id, "Order cancelled");
    Ok(Json(canceled))
}

/// `GET /api/orders/canceled` - the caller's canceled orders.
pub async fn list_canceled(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CanceledOrder>>> {
    let orders = OrderRepository::new(state.pool())
        .list_canceled_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/orders/canceled/all` (admin)
pub async fn list_canceled_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CanceledOrder>>> {
    let orders = OrderRepository::new(state.pool())
        .list_canceled_all()
        .await?;
    Ok(Json(orders))
}
