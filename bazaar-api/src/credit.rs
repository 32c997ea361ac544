use axum::{extract::State, routing::{get, post}, Router};
use bazaar_credit::{AssessmentReport, CreditAssessment, CreditInfo, NewRetailer, Retailer, RetailerUpdate};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{Actor, Json, Path};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/retailers", post(add_retailer))
        .route("/retailers/{id}", get(verify_retailer).put(update_retailer))
        .route("/retailers/{id}/credit-info", get(credit_info))
        .route("/retailers/{id}/assessments", get(assessment_history))
        .route("/retailers/{id}/assessments/latest", get(latest_assessment))
        .route("/assessment/{id}", post(assess))
}

/// GET /retailers/:id
pub async fn verify_retailer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Retailer>, AppError> {
    Ok(ApiResponse::ok(state.credit.get(id).await?))
}

/// POST /retailers
pub async fn add_retailer(
    State(state): State<AppState>,
    actor: Actor,
    Json(draft): Json<NewRetailer>,
) -> Result<ApiResponse<Retailer>, AppError> {
    let retailer = state.credit.register(draft).await?;
    tracing::debug!(retailer_id = %retailer.id, %actor, "retailer added");
    Ok(ApiResponse::created(retailer).with_message("Retailer added successfully"))
}

/// PUT /retailers/:id
pub async fn update_retailer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<RetailerUpdate>,
) -> Result<ApiResponse<Retailer>, AppError> {
    let retailer = state.credit.update(id, &changes).await?;
    Ok(ApiResponse::ok(retailer).with_message("Retailer updated successfully"))
}

/// POST /assessment/:id
pub async fn assess(
    State(state): State<AppState>,
    actor: Actor,
    Path(retailer_id): Path<Uuid>,
) -> Result<ApiResponse<AssessmentReport>, AppError> {
    let report = state.credit.assess(retailer_id).await?;
    tracing::debug!(%retailer_id, %actor, "assessment requested");
    Ok(ApiResponse::ok(report).with_message("Credit risk assessment completed"))
}

/// GET /retailers/:id/credit-info
pub async fn credit_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CreditInfo>, AppError> {
    Ok(ApiResponse::ok(state.credit.credit_info(id).await?))
}

/// GET /retailers/:id/assessments
pub async fn assessment_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<CreditAssessment>>, AppError> {
    Ok(ApiResponse::list(state.credit.history(id).await?))
}

/// GET /retailers/:id/assessments/latest
pub async fn latest_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CreditAssessment>, AppError> {
    Ok(ApiResponse::ok(state.credit.latest(id).await?))
}
