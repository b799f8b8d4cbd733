//! User administration

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::user::{User, UserRole};
use crate::infrastructure::crypto::password::hash_password;
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// admin or operator
    #[serde(default)]
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All users (password hashes omitted)"))
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = state.repos.users().list().await?;
    Ok(Json(json!({ "count": users.len(), "users": users })))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = UserCreateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<UserCreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if request.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {e}")))?;
    let role = request
        .role
        .as_deref()
        .map(UserRole::parse)
        .unwrap_or(UserRole::Operator);

    let user = state
        .repos
        .users()
        .insert(User::new(&request.username, &request.email, password_hash, role))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role.as_str(),
        })),
    ))
}
