//! Connector listing and deletion

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/chargers/{charger_id}/connectors",
    tag = "Connectors",
    params(("charger_id" = String, Path, description = "Charger ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Connectors of one charger"))
)]
pub async fn list(
    State(state): State<AppState>,
    Path(charger_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let connectors = state.repos.connectors().list_for_charger(&charger_id).await?;
    Ok(Json(json!({
        "count": connectors.len(),
        "connectors": connectors,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/chargers/{charger_id}/connectors/{connector_id}",
    tag = "Connectors",
    params(
        ("charger_id" = String, Path, description = "Charger ID"),
        ("connector_id" = i32, Path, description = "OCPP connector ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Connector deleted"),
        (status = 400, description = "Connector has an active session"),
        (status = 404, description = "Connector unknown")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((charger_id, connector_id)): Path<(String, i32)>,
) -> Result<Json<Value>, ApiError> {
    // A connector with an Active session cannot be removed.
    if state
        .repos
        .sessions()
        .has_active_for_connector(&charger_id, connector_id)
        .await?
    {
        return Err(ApiError::bad_request(format!(
            "Connector {connector_id} on charger '{charger_id}' has an active charging session"
        )));
    }

    state.repos.connectors().delete(&charger_id, connector_id).await?;
    Ok(Json(json!({
        "charger_id": charger_id,
        "connector_id": connector_id,
        "deleted": true,
    })))
}
