use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use bazaar_catalog::{NewProduct, Product, ProductFilter, ProductUpdate, StockLevel};
use bazaar_core::CoreError;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{Actor, Json, Path, Query};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/add-stock", post(add_stock))
        .route("/products/{id}/deduct-stock", post(deduct_stock))
        .route("/products/{id}/stock-level", get(stock_level))
}

/// Pull a strictly positive integer `quantity` out of a stock request.
/// Strings, fractions and out-of-range numbers are all refused.
fn requested_quantity(body: &Value) -> Result<i32, CoreError> {
    body.get("quantity")
        .and_then(Value::as_i64)
        .filter(|q| *q > 0)
        .and_then(|q| i32::try_from(q).ok())
        .ok_or_else(|| CoreError::invalid_input("quantity must be a positive integer"))
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<ApiResponse<Vec<Product>>, AppError> {
    let products = state.ledger.list(&filter).await?;
    Ok(ApiResponse::list(products))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Product>, AppError> {
    Ok(ApiResponse::ok(state.ledger.get(id).await?))
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(draft): Json<NewProduct>,
) -> Result<ApiResponse<Product>, AppError> {
    let product = state.ledger.register(draft).await?;
    tracing::info!(product_id = %product.id, %actor, "product created");
    Ok(ApiResponse::created(product).with_message("Product added successfully"))
}

/// PUT /products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProductUpdate>,
) -> Result<ApiResponse<Product>, AppError> {
    let product = state.ledger.update(id, &changes).await?;
    Ok(ApiResponse::ok(product).with_message("Product updated successfully"))
}

/// DELETE /products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Value>, AppError> {
    state.ledger.remove(id).await?;
    tracing::info!(product_id = %id, %actor, "product removed");
    Ok(ApiResponse::ok(Value::Null).with_message("Product deleted successfully"))
}

/// POST /products/:id/add-stock
pub async fn add_stock(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<ApiResponse<Product>, AppError> {
    let quantity = requested_quantity(&body)?;
    let product = state.ledger.add_stock(id, quantity).await?;
    tracing::debug!(product_id = %id, quantity, %actor, "stock added");
    Ok(ApiResponse::ok(product).with_message(format!("Added {} units to stock", quantity)))
}

/// POST /products/:id/deduct-stock
pub async fn deduct_stock(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<ApiResponse<Product>, AppError> {
    let quantity = requested_quantity(&body)?;
    let product = state.ledger.deduct_stock(id, quantity).await?;
    tracing::debug!(product_id = %id, quantity, %actor, "stock deducted");
    Ok(ApiResponse::ok(product).with_message(format!("Deducted {} units from stock", quantity)))
}

/// GET /products/:id/stock-level
pub async fn stock_level(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<StockLevel>, AppError> {
    Ok(ApiResponse::ok(state.ledger.stock_level(id).await?))
}
