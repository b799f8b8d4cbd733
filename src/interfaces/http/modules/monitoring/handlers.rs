//! Monitoring endpoints: stats, live connections, connection events and
//! per-charger retry policy.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::domain::charger::RetryPolicy;
use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Monitoring",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Aggregated service statistics"))
)]
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "connections": state.registry.stats(),
        "retry_engine": state.engine.stats(),
        "bridge": state.bridge.stats(),
        "sessions": state.projector.stats(),
        "dropped_log_writes": state.repos.message_logs().dropped_writes(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "Monitoring",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Live charge-point connections"))
)]
pub async fn connections(State(state): State<AppState>) -> Json<Value> {
    let mut entries = Vec::new();
    for charger_id in state.registry.connected_ids() {
        entries.push(json!({
            "charger_id": charger_id,
            "connection_id": state.registry.connection_id_for(&charger_id),
            "connected_since": state.registry.connected_since(&charger_id),
        }));
    }
    Json(json!({
        "count": entries.len(),
        "connections": entries,
    }))
}

#[utoipa::path(
    get,
    path = "/api/connections/{charger_id}",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Connection detail"),
        (status = 404, description = "Charger not connected")
    )
)]
pub async fn connection_detail(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.registry.is_connected(&charger_id) {
        return Err(ApiError::not_found(format!(
            "Charger '{charger_id}' is not connected"
        )));
    }
    let charger = state.repos.chargers().find_by_id(&charger_id).await?;
    Ok(Json(json!({
        "charger_id": charger_id,
        "connection_id": state.registry.connection_id_for(&charger_id),
        "connected_since": state.registry.connected_since(&charger_id),
        "last_heartbeat": charger.as_ref().and_then(|c| c.last_heartbeat),
        "status": charger.as_ref().map(|c| c.status.as_str()),
        "pending_commands": state.engine.pending_for(&charger_id).len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/connection-events",
    tag = "Monitoring",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Recent connection events"))
)]
pub async fn connection_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Value>, ApiError> {
    let events = state
        .repos
        .connection_events()
        .list(None, query.limit.unwrap_or(100))
        .await?;
    Ok(Json(json!({ "count": events.len(), "events": events })))
}

#[utoipa::path(
    get,
    path = "/api/connection-events/{charger_id}",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Connection events for one charger"))
)]
pub async fn connection_events_for_charger(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Value>, ApiError> {
    let events = state
        .repos
        .connection_events()
        .list(Some(&charger_id), query.limit.unwrap_or(100))
        .await?;
    Ok(Json(json!({ "count": events.len(), "events": events })))
}

// ── Retry configuration ────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RetryConfigRequest {
    /// 1..=10
    pub max_retries: u32,
    /// Seconds, 1..=60
    pub retry_interval: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[utoipa::path(
    get,
    path = "/api/retry-config/{charger_id}",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Per-charger retry policy"),
        (status = 404, description = "Charger unknown")
    )
)]
pub async fn get_retry_config(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let charger = state
        .repos
        .chargers()
        .find_by_id(&charger_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Charger '{charger_id}' not found")))?;
    Ok(Json(json!({
        "charger_id": charger_id,
        "max_retries": charger.retry_policy.max_retries,
        "retry_interval": charger.retry_policy.retry_interval_s,
        "retry_enabled": charger.retry_policy.enabled,
    })))
}

#[utoipa::path(
    post,
    path = "/api/retry-config/{charger_id}",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    request_body = RetryConfigRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Policy updated"),
        (status = 400, description = "Out-of-range policy")
    )
)]
pub async fn set_retry_config(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
    Json(request): Json<RetryConfigRequest>,
) -> Result<Json<Value>, ApiError> {
    let policy = RetryPolicy {
        max_retries: request.max_retries,
        retry_interval_s: request.retry_interval,
        enabled: request.enabled,
    };
    state
        .repos
        .chargers()
        .update_retry_policy(&charger_id, policy)
        .await?;
    Ok(Json(json!({
        "charger_id": charger_id,
        "max_retries": policy.max_retries,
        "retry_interval": policy.retry_interval_s,
        "retry_enabled": policy.enabled,
    })))
}

#[utoipa::path(
    post,
    path = "/api/retry-config/{charger_id}/enable",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Retries enabled"))
)]
pub async fn enable_retries(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    toggle_retries(&state, &charger_id, true).await
}

#[utoipa::path(
    post,
    path = "/api/retry-config/{charger_id}/disable",
    tag = "Monitoring",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Retries disabled"))
)]
pub async fn disable_retries(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    toggle_retries(&state, &charger_id, false).await
}

async fn toggle_retries(
    state: &AppState,
    charger_id: &str,
    enabled: bool,
) -> Result<Json<Value>, ApiError> {
    let charger = state
        .repos
        .chargers()
        .find_by_id(charger_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Charger '{charger_id}' not found")))?;
    let policy = RetryPolicy {
        enabled,
        ..charger.retry_policy
    };
    state
        .repos
        .chargers()
        .update_retry_policy(charger_id, policy)
        .await?;
    Ok(Json(json!({
        "charger_id": charger_id,
        "retry_enabled": enabled,
    })))
}
