//! Bearer-token authentication middleware

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims};

use super::common::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtConfig,
}

/// Rejects requests without a valid `Authorization: Bearer <jwt>` header.
/// The verified claims are attached as a request extension.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims: TokenClaims = verify_token(token, &auth.jwt)
        .map_err(|_| ApiError::unauthorized("Invalid authentication credentials"))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
