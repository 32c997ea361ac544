use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bazaar_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

/// Internal failure text, attached to 500 responses and only rendered when
/// `expose_error_details` is layered on.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let body = Json(json!({
            "success": false,
            "message": message,
            "error": message,
        }));
        let mut response = (status, body).into_response();

        if let AppError::Internal(err) = self {
            tracing::error!(error = ?err, "Internal Server Error");
            response.extensions_mut().insert(ErrorDetail(format!("{:#}", err)));
        }
        response
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => AppError::NotFound(msg),
            CoreError::InvalidInput(_)
            | CoreError::InvalidTransition { .. }
            | CoreError::TerminalState(_) => AppError::Validation(err.to_string()),
            CoreError::Conflict(_) | CoreError::InsufficientStock { .. } => {
                AppError::Conflict(err.to_string())
            }
            CoreError::Storage(_) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Development mode: re-render 500 envelopes with the underlying error.
pub async fn expose_error_details(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<ErrorDetail>() {
        Some(ErrorDetail(detail)) => {
            let body = Json(json!({
                "success": false,
                "message": "Internal server error",
                "error": detail,
            }));
            (response.status(), body).into_response()
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_core_error_status_mapping() {
        let cases = vec![
            (CoreError::not_found("Order", Uuid::nil()), StatusCode::NOT_FOUND),
            (CoreError::invalid_input("bad"), StatusCode::BAD_REQUEST),
            (
                CoreError::InvalidTransition { from: "pending".into(), to: "shipped".into() },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::TerminalState("delivered".into()), StatusCode::BAD_REQUEST),
            (CoreError::Conflict("race".into()), StatusCode::CONFLICT),
            (
                CoreError::InsufficientStock { product_id: Uuid::nil(), requested: 5, available: 1 },
                StatusCode::CONFLICT,
            ),
            (CoreError::Storage("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = AppError::from(CoreError::Storage("password authentication failed".into()));
        assert_eq!(err.to_string(), "Internal server error");

        let response = err.into_response();
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert!(detail.0.contains("password authentication failed"));
    }

    #[tokio::test]
    async fn test_envelope_carries_message() {
        let response = AppError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Rate limit exceeded");
        assert_eq!(body["error"], "Rate limit exceeded");
    }
}
