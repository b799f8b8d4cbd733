//! Remote command endpoints
//!
//! Each endpoint maps 1:1 to an outbound OCPP builder. The common path:
//! verify the charger, build the payload, hand it to the retry engine and
//! answer with the message id for log correlation.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::application::commands::{
    AvailabilityType, ChangeAvailability, ChangeConfiguration, ClearCache, ClearChargingProfile,
    GetConfiguration, GetDiagnostics, GetLocalListVersion, LocalListEntry, RemoteStartTransaction,
    RemoteStopTransaction, Reset, ResetType, SendLocalList, SetChargingProfile, TriggerMessage,
    TriggerMessageKind, UnlockConnector, UpdateType,
};
use crate::domain::connection_event::ConnectionEventType;
use crate::interfaces::http::common::{ApiError, CommandAccepted};
use crate::interfaces::http::router::AppState;

use super::dto::*;

// ── Common checks ──────────────────────────────────────────────

/// The charger must exist in persistence (a currently connected but
/// unregistered charger is registered on the fly, as the field does connect
/// before any admin touches it).
async fn ensure_known(state: &AppState, charger_id: &str) -> Result<(), ApiError> {
    if state.repos.chargers().find_by_id(charger_id).await?.is_some() {
        return Ok(());
    }
    if state.registry.is_connected(charger_id) {
        state.service.mark_connected(charger_id).await?;
        return Ok(());
    }
    Err(ApiError::not_found(format!(
        "Charger '{charger_id}' not found. Connected chargers: {:?}",
        state.registry.connected_ids()
    )))
}

/// The charger's latest connection event must be CONNECT and its socket
/// live. Builders that queue while disconnected skip this.
async fn ensure_connected(state: &AppState, charger_id: &str) -> Result<(), ApiError> {
    ensure_known(state, charger_id).await?;

    let latest = state
        .repos
        .connection_events()
        .latest_for_charger(charger_id)
        .await?;
    match latest {
        Some(event) if event.event_type == ConnectionEventType::Connect => {}
        Some(event) => {
            return Err(ApiError::bad_request(format!(
                "Charger '{charger_id}' is not currently connected. Last event: '{}'",
                event.event_type.as_str()
            )));
        }
        None => {
            return Err(ApiError::bad_request(format!(
                "Charger '{charger_id}' is not currently connected"
            )));
        }
    }

    if !state.registry.is_connected(charger_id) {
        return Err(ApiError::bad_request(format!(
            "Charger '{charger_id}' is not currently connected"
        )));
    }
    Ok(())
}

fn validated<T: Validate>(request: &T) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

// ── Endpoints ──────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/ocpp/remote/start",
    tag = "OCPP Commands",
    request_body = RemoteStartRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Command dispatched", body = CommandAccepted),
        (status = 400, description = "Charger not connected"),
        (status = 404, description = "Charger unknown")
    )
)]
pub async fn remote_start(
    State(state): State<AppState>,
    Json(request): Json<RemoteStartRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = RemoteStartTransaction {
        id_tag: request.id_tag,
        connector_id: request.connector_id,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "Remote start command sent successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/remote/stop",
    tag = "OCPP Commands",
    request_body = RemoteStopRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Command dispatched", body = CommandAccepted),
        (status = 404, description = "No active charging session")
    )
)]
pub async fn remote_stop(
    State(state): State<AppState>,
    Json(request): Json<RemoteStopRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let session = state
        .service
        .latest_active_session(&request.charger_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "No active charging session found for charger '{}'",
                request.charger_id
            ))
        })?;
    let transaction_id = session.transaction_id.ok_or_else(|| {
        ApiError::bad_request(format!(
            "Active session for charger '{}' has no transaction id",
            request.charger_id
        ))
    })?;

    let call = RemoteStopTransaction { transaction_id }.build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("Remote stop command sent successfully for transaction_id {transaction_id}"),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/connector/unlock",
    tag = "OCPP Commands",
    request_body = UnlockConnectorRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Command dispatched", body = CommandAccepted),
        (status = 404, description = "Connector unknown")
    )
)]
pub async fn unlock_connector(
    State(state): State<AppState>,
    Json(request): Json<UnlockConnectorRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    if state
        .repos
        .connectors()
        .find(&request.charger_id, request.connector_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Connector {} not found on charger '{}'",
            request.connector_id, request.charger_id
        )));
    }

    let call = UnlockConnector {
        connector_id: request.connector_id,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("Unlock command sent for connector {}", request.connector_id),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/configuration/get",
    tag = "OCPP Commands",
    request_body = GetConfigurationRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn get_configuration(
    State(state): State<AppState>,
    Json(request): Json<GetConfigurationRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = GetConfiguration {
        keys: request.keys,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "GetConfiguration command sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/configuration/set",
    tag = "OCPP Commands",
    request_body = SetConfigurationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sent, or queued for retry when the charger is offline", body = CommandAccepted),
        (status = 404, description = "Charger has never connected")
    )
)]
pub async fn set_configuration(
    State(state): State<AppState>,
    Json(request): Json<SetConfigurationRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;

    // ChangeConfiguration queues while disconnected; the only requirement is
    // that the charger has connected at least once.
    if state
        .repos
        .connection_events()
        .latest_for_charger(&request.charger_id)
        .await?
        .is_none()
        && state
            .repos
            .chargers()
            .find_by_id(&request.charger_id)
            .await?
            .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Charger '{}' has never connected.",
            request.charger_id
        )));
    }

    let connected = state.registry.is_connected(&request.charger_id);
    let call = ChangeConfiguration {
        key: request.key.clone(),
        value: request.value.clone(),
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    let message = if connected {
        format!("ChangeConfiguration command sent for key '{}'", request.key)
    } else {
        "ChangeConfiguration command queued for retry (charger not connected)".to_string()
    };
    Ok(Json(CommandAccepted::new(message_id, message)))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/availability/change",
    tag = "OCPP Commands",
    request_body = ChangeAvailabilityRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn change_availability(
    State(state): State<AppState>,
    Json(request): Json<ChangeAvailabilityRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let kind = AvailabilityType::parse(&request.kind).ok_or_else(|| {
        ApiError::bad_request(format!(
            "type must be Operative or Inoperative, got '{}'",
            request.kind
        ))
    })?;
    let call = ChangeAvailability {
        connector_id: request.connector_id,
        kind,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("ChangeAvailability ({}) command sent", kind.as_str()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/reset",
    tag = "OCPP Commands",
    request_body = ResetRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let kind = ResetType::parse(&request.kind).ok_or_else(|| {
        ApiError::bad_request(format!("type must be Hard or Soft, got '{}'", request.kind))
    })?;
    let call = Reset { kind }.build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("{} reset command sent", kind.as_str()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/trigger",
    tag = "OCPP Commands",
    request_body = TriggerMessageRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn trigger_message(
    State(state): State<AppState>,
    Json(request): Json<TriggerMessageRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let requested = TriggerMessageKind::parse(&request.requested_message).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unsupported requestedMessage '{}'",
            request.requested_message
        ))
    })?;
    let call = TriggerMessage {
        requested_message: requested,
        connector_id: request.connector_id,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("TriggerMessage ({}) command sent", requested.as_str()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/cache/clear",
    tag = "OCPP Commands",
    request_body = ClearCacheRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn clear_cache(
    State(state): State<AppState>,
    Json(request): Json<ClearCacheRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = ClearCache.build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(message_id, "ClearCache command sent")))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/local_list/send",
    tag = "OCPP Commands",
    request_body = SendLocalListRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn send_local_list(
    State(state): State<AppState>,
    Json(request): Json<SendLocalListRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let update_type = UpdateType::parse(&request.update_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "updateType must be Differential or Full, got '{}'",
            request.update_type
        ))
    })?;
    let call = SendLocalList {
        list_version: request.list_version,
        update_type,
        entries: request
            .local_authorization_list
            .into_iter()
            .map(|entry| LocalListEntry {
                id_tag: entry.id_tag,
                id_tag_info: entry.id_tag_info,
            })
            .collect(),
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        format!("SendLocalList (version {}) command sent", request.list_version),
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/local_list_version/get",
    tag = "OCPP Commands",
    request_body = GetLocalListVersionRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn get_local_list_version(
    State(state): State<AppState>,
    Json(request): Json<GetLocalListVersionRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = GetLocalListVersion.build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "GetLocalListVersion command sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/diagnostics/get",
    tag = "OCPP Commands",
    request_body = GetDiagnosticsRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn get_diagnostics(
    State(state): State<AppState>,
    Json(request): Json<GetDiagnosticsRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = GetDiagnostics {
        location: request.location,
        start_time: request.start_time,
        stop_time: request.stop_time,
        retries: request.retries,
        retry_interval: request.retry_interval,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "GetDiagnostics command sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/charging_profile/set",
    tag = "OCPP Commands",
    request_body = SetChargingProfileRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn set_charging_profile(
    State(state): State<AppState>,
    Json(request): Json<SetChargingProfileRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = SetChargingProfile {
        connector_id: request.connector_id,
        charging_profile: request.charging_profile,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "SetChargingProfile command sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/charging_profile/clear",
    tag = "OCPP Commands",
    request_body = ClearChargingProfileRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn clear_charging_profile(
    State(state): State<AppState>,
    Json(request): Json<ClearChargingProfileRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = ClearChargingProfile {
        connector_id: request.connector_id,
        charging_profile_id: request.charging_profile_id,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "ClearChargingProfile command sent",
    )))
}

#[utoipa::path(
    post,
    path = "/api/ocpp/firmware/update",
    tag = "OCPP Commands",
    request_body = UpdateFirmwareRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Command dispatched", body = CommandAccepted))
)]
pub async fn update_firmware(
    State(state): State<AppState>,
    Json(request): Json<UpdateFirmwareRequest>,
) -> Result<Json<CommandAccepted>, ApiError> {
    validated(&request)?;
    ensure_connected(&state, &request.charger_id).await?;

    let call = crate::application::commands::UpdateFirmware {
        location: request.location,
        retrieve_date: request.retrieve_date,
        retries: request.retries,
        retry_interval: request.retry_interval,
    }
    .build()?;
    let message_id = state
        .engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await?;

    Ok(Json(CommandAccepted::new(
        message_id,
        "UpdateFirmware command sent",
    )))
}

// ── Pending introspection ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub charger_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ocpp/commands/pending",
    tag = "OCPP Commands",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Pending outbound commands"))
)]
pub async fn pending_commands(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Json<Value> {
    let pending = match query.charger_id.as_deref() {
        Some(charger_id) => state.engine.pending_for(charger_id),
        None => state.engine.pending_all(),
    };
    Json(json!({
        "count": pending.len(),
        "pending": pending,
    }))
}
