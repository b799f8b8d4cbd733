//! Health and Prometheus metrics endpoints

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::interfaces::http::router::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Component health"))
)]
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = state.repos.chargers().list().await.is_ok();
    Json(json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "timestamp": Utc::now(),
        "components": {
            "database": if db_ok { "up" } else { "down" },
            "websocket_connections": state.registry.connection_count(),
            "master_observers": state.registry.master_count(),
            "dashboards": state.registry.dashboard_count(),
            "pending_commands": state.engine.pending_count(),
            "bridge_queue": state.bridge.queue_enabled(),
        },
    }))
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus.render()
}
