//! DiagnosticsStatusNotification handler

use serde_json::{json, Value};
use tracing::info;

use crate::support::errors::DomainResult;

use super::{field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        status = ?field_str(payload, "status"),
        "DiagnosticsStatusNotification"
    );
    Ok(json!({}))
}
