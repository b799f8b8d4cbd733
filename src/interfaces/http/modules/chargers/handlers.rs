//! Charger CRUD endpoints (thin admin surface over persistence)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::charger::{Charger, ChargerStatus};
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChargerCreateRequest {
    pub charger_id: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub site_id: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChargerUpdateRequest {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub site_id: Option<String>,
    pub organization_id: Option<String>,
}

fn charger_json(charger: &Charger, connected_now: bool) -> Value {
    json!({
        "charger_id": charger.id,
        "vendor": charger.vendor,
        "model": charger.model,
        "serial_number": charger.serial_number,
        "firmware_version": charger.firmware_version,
        "status": charger.status.as_str(),
        "is_connected": connected_now,
        "last_heartbeat": charger.last_heartbeat,
        "connection_time": charger.connection_time,
        "disconnect_time": charger.disconnect_time,
        "max_retries": charger.retry_policy.max_retries,
        "retry_interval": charger.retry_policy.retry_interval_s,
        "retry_enabled": charger.retry_policy.enabled,
        "site_id": charger.site_id,
        "organization_id": charger.organization_id,
        "created_at": charger.created_at,
    })
}

#[utoipa::path(
    get,
    path = "/api/chargers",
    tag = "Chargers",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All registered chargers"))
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let chargers = state.repos.chargers().list().await?;
    let items: Vec<Value> = chargers
        .iter()
        .map(|c| charger_json(c, state.registry.is_connected(&c.id)))
        .collect();
    Ok(Json(json!({ "count": items.len(), "chargers": items })))
}

#[utoipa::path(
    get,
    path = "/api/chargers/{charger_id}",
    tag = "Chargers",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Charger detail"),
        (status = 404, description = "Unknown charger")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let charger = state
        .repos
        .chargers()
        .find_by_id(&charger_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Charger '{charger_id}' not found")))?;
    Ok(Json(charger_json(
        &charger,
        state.registry.is_connected(&charger_id),
    )))
}

#[utoipa::path(
    post,
    path = "/api/chargers",
    tag = "Chargers",
    request_body = ChargerCreateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Charger registered"),
        (status = 409, description = "Charger already exists")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ChargerCreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if request.charger_id.trim().is_empty() {
        return Err(ApiError::bad_request("charger_id must not be empty"));
    }

    let mut charger = Charger::unknown(&request.charger_id);
    charger.is_connected = false;
    charger.last_heartbeat = None;
    charger.connection_time = None;
    charger.vendor = request.vendor;
    charger.model = request.model;
    charger.serial_number = request.serial_number;
    charger.site_id = request.site_id;
    charger.organization_id = request.organization_id;
    charger.status = ChargerStatus::Offline;

    state.repos.chargers().insert(charger.clone()).await?;
    Ok((StatusCode::CREATED, Json(charger_json(&charger, false))))
}

#[utoipa::path(
    put,
    path = "/api/chargers/{charger_id}",
    tag = "Chargers",
    params(("charger_id" = String, Path, description = "Charger ID")),
    request_body = ChargerUpdateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Charger updated"),
        (status = 404, description = "Unknown charger")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
    Json(request): Json<ChargerUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut charger = state
        .repos
        .chargers()
        .find_by_id(&charger_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Charger '{charger_id}' not found")))?;

    if request.vendor.is_some() {
        charger.vendor = request.vendor;
    }
    if request.model.is_some() {
        charger.model = request.model;
    }
    if request.serial_number.is_some() {
        charger.serial_number = request.serial_number;
    }
    if request.firmware_version.is_some() {
        charger.firmware_version = request.firmware_version;
    }
    if request.site_id.is_some() {
        charger.site_id = request.site_id;
    }
    if request.organization_id.is_some() {
        charger.organization_id = request.organization_id;
    }

    state.repos.chargers().update(charger.clone()).await?;
    Ok(Json(charger_json(
        &charger,
        state.registry.is_connected(&charger_id),
    )))
}

#[utoipa::path(
    post,
    path = "/api/chargers/{charger_id}/offline",
    tag = "Chargers",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Charger marked offline"))
)]
pub async fn mark_offline(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .repos
        .chargers()
        .update_status(&charger_id, ChargerStatus::Offline)
        .await?;
    state.repos.chargers().set_connected(&charger_id, false).await?;
    Ok(Json(json!({ "charger_id": charger_id, "status": "Offline" })))
}

#[utoipa::path(
    get,
    path = "/api/chargers/{charger_id}/sessions",
    tag = "Chargers",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Charging sessions for one charger"))
)]
pub async fn sessions(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let sessions = state.repos.sessions().list_for_charger(&charger_id).await?;
    Ok(Json(json!({ "count": sessions.len(), "sessions": sessions })))
}
