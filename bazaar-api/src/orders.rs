use axum::{extract::State, routing::{get, post, put}, Router};
use bazaar_order::{NewOrder, Order, OrderStatus, StatusChange, TrackingEvent};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{Actor, Json, Path};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/{id}", get(get_order).delete(cancel_order))
        .route("/orders/customer/{id}", get(list_customer_orders))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/tracking", get(tracking))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /orders
pub async fn place_order(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<NewOrder>,
) -> Result<ApiResponse<Order>, AppError> {
    let order = state.orders.place(request).await?;
    tracing::debug!(order_id = %order.id, %actor, "order accepted");
    Ok(ApiResponse::created(order).with_message("Order placed successfully"))
}

/// GET /orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Order>, AppError> {
    Ok(ApiResponse::ok(state.orders.get(id).await?))
}

/// GET /orders/customer/:id
///
/// Orders are owned by retailers; the path segment is the retailer id.
pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(retailer_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<Order>>, AppError> {
    let orders = state.orders.list_for_retailer(retailer_id).await?;
    Ok(ApiResponse::list(orders))
}

/// PUT /orders/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<ApiResponse<StatusChange>, AppError> {
    let status: OrderStatus = request.status.parse()?;
    let change = state
        .orders
        .update_status(id, status, request.location, request.notes)
        .await?;
    tracing::debug!(order_id = %id, %status, %actor, "status change accepted");
    Ok(ApiResponse::ok(change).with_message("Order status updated successfully"))
}

/// GET /orders/:id/tracking
pub async fn tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<TrackingEvent>>, AppError> {
    let events = state.orders.tracking(id).await?;
    Ok(ApiResponse::list(events))
}

/// DELETE /orders/:id
///
/// Cancellation is a status transition; the order row is kept.
pub async fn cancel_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<StatusChange>, AppError> {
    let change = state.orders.cancel(id).await?;
    tracing::debug!(order_id = %id, %actor, "order cancelled");
    Ok(ApiResponse::ok(change).with_message("Order cancelled successfully"))
}
