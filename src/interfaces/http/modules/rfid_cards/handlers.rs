//! RFID card CRUD and authorization-status lookup

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::rfid_card::{authorization_status, RfidCard};
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RfidCardCreateRequest {
    pub id_tag: String,
    pub user_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_blocked: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RfidCardUpdateRequest {
    pub user_id: Option<String>,
    pub is_active: Option<bool>,
    pub is_blocked: Option<bool>,
    pub expiry_date: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[utoipa::path(
    get,
    path = "/api/rfid-cards",
    tag = "RFID Cards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All RFID cards"))
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cards = state.repos.rfid_cards().list().await?;
    Ok(Json(json!({ "count": cards.len(), "cards": cards })))
}

#[utoipa::path(
    post,
    path = "/api/rfid-cards",
    tag = "RFID Cards",
    request_body = RfidCardCreateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Card created"),
        (status = 409, description = "id_tag already exists")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<RfidCardCreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if request.id_tag.trim().is_empty() || request.id_tag.len() > 20 {
        return Err(ApiError::bad_request("id_tag must be 1..=20 characters"));
    }

    let mut card = RfidCard::new(&request.id_tag);
    card.user_id = request.user_id;
    card.is_active = request.is_active;
    card.is_blocked = request.is_blocked;
    card.expiry_date = request.expiry_date;

    let card = state.repos.rfid_cards().insert(card).await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(card).unwrap_or(Value::Null))))
}

#[utoipa::path(
    get,
    path = "/api/rfid-cards/{id_tag}",
    tag = "RFID Cards",
    params(("id_tag" = String, Path, description = "Card tag")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card detail"),
        (status = 404, description = "Unknown card")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id_tag): Path<String>,
) -> Result<Json<RfidCard>, ApiError> {
    let card = state
        .repos
        .rfid_cards()
        .find_by_tag(&id_tag)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("RFID card '{id_tag}' not found")))?;
    Ok(Json(card))
}

#[utoipa::path(
    put,
    path = "/api/rfid-cards/{id_tag}",
    tag = "RFID Cards",
    params(("id_tag" = String, Path, description = "Card tag")),
    request_body = RfidCardUpdateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card updated"),
        (status = 404, description = "Unknown card")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id_tag): Path<String>,
    Json(request): Json<RfidCardUpdateRequest>,
) -> Result<Json<RfidCard>, ApiError> {
    let mut card = state
        .repos
        .rfid_cards()
        .find_by_tag(&id_tag)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("RFID card '{id_tag}' not found")))?;

    if request.user_id.is_some() {
        card.user_id = request.user_id;
    }
    if let Some(is_active) = request.is_active {
        card.is_active = is_active;
    }
    if let Some(is_blocked) = request.is_blocked {
        card.is_blocked = is_blocked;
    }
    if request.expiry_date.is_some() {
        card.expiry_date = request.expiry_date;
    }
    card.updated_at = Utc::now();

    state.repos.rfid_cards().update(card.clone()).await?;
    Ok(Json(card))
}

#[utoipa::path(
    delete,
    path = "/api/rfid-cards/{id_tag}",
    tag = "RFID Cards",
    params(("id_tag" = String, Path, description = "Card tag")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card deleted"),
        (status = 404, description = "Unknown card")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id_tag): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.repos.rfid_cards().delete(&id_tag).await?;
    Ok(Json(json!({ "id_tag": id_tag, "deleted": true })))
}

#[utoipa::path(
    get,
    path = "/api/rfid-cards/{id_tag}/status",
    tag = "RFID Cards",
    params(("id_tag" = String, Path, description = "Card tag")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Authorization status for the tag"))
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id_tag): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let card = state.repos.rfid_cards().find_by_tag(&id_tag).await?;
    let status = authorization_status(card.as_ref(), Utc::now());
    Ok(Json(json!({
        "id_tag": id_tag,
        "status": status.as_str(),
        "is_active": card.as_ref().map(|c| c.is_active),
        "is_blocked": card.as_ref().map(|c| c.is_blocked),
        "expiry_date": card.as_ref().and_then(|c| c.expiry_date),
    })))
}
