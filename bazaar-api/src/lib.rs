use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod credit;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod response;
pub mod state;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    let mut api = Router::new()
        .nest("/inventory", products::routes())
        .nest("/delivery", orders::routes())
        .nest("/credit", credit::routes());

    if let Some(auth) = state.auth.clone() {
        api = api.route_layer(from_fn_with_state(auth, middleware::require_principal));
    }

    // Added after the auth layer so probes stay unauthenticated.
    let api = api.route("/health", get(health));

    let mut router = Router::new().nest("/api", api).fallback(not_found);

    if let Some(rate_limit) = state.rate_limit.clone() {
        router = router.layer(from_fn_with_state(rate_limit, middleware::rate_limit_middleware));
    }
    if state.expose_error_details {
        router = router.layer(from_fn(error::expose_error_details));
    }

    router
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<Value> {
    axum::Json(json!({
        "success": true,
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}
