//! Message log listing

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::interfaces::http::common::ApiError;
use crate::interfaces::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub charger_id: Option<String>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/logs/messages",
    tag = "Logs",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Recent OCPP message log entries"))
)]
pub async fn messages(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Value>, ApiError> {
    let logs = state
        .repos
        .message_logs()
        .list(query.charger_id.as_deref(), query.limit.unwrap_or(100))
        .await?;
    Ok(Json(json!({ "count": logs.len(), "logs": logs })))
}
