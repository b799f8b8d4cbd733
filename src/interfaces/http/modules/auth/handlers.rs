//! Login endpoint issuing HS256 bearer tokens

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::infrastructure::crypto::jwt::create_token;
use crate::infrastructure::crypto::password::verify_password;
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in_minutes: i64,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut user = state
        .repos
        .users()
        .find_by_username(&request.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !user.is_active || !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let token = create_token(&user.username, user.role.as_str(), &state.auth.jwt)
        .map_err(|e| ApiError::internal(format!("Token creation failed: {e}")))?;

    user.last_login = Some(Utc::now());
    let _ = state.repos.users().update(user).await;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in_minutes: state.auth.jwt.expire_minutes,
    }))
}
