use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use bazaar_shared::{Principal, Role};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AuthConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Verify the bearer token and place the caller's `Principal` in request
/// extensions. Role checks are left to whoever consumes the principal.
pub async fn require_principal(
    State(auth): State<AuthConfig>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("Access denied. No token provided.".into()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::Authentication("Access denied. Invalid token.".into())
    })?;

    let claims = token_data.claims;
    req.extensions_mut().insert(Principal::new(claims.sub, claims.role));

    Ok(next.run(req).await)
}
