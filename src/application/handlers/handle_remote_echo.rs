//! Handlers for CS→CP actions echoed back by charge points
//!
//! Some stations mirror TriggerMessage / RemoteStartTransaction /
//! RemoteStopTransaction as CALLs of their own. They are acknowledged so the
//! station does not retry them.

use serde_json::{json, Value};
use tracing::info;

use crate::support::errors::DomainResult;

use super::{field_i32, field_str, OcppHandler};

pub async fn handle_trigger(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        requested_message = ?field_str(payload, "requestedMessage"),
        connector_id = ?field_i32(payload, "connectorId"),
        "TriggerMessage echoed from charge point"
    );
    Ok(json!({ "status": "Accepted" }))
}

pub async fn handle_remote_start(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        id_tag = ?field_str(payload, "idTag"),
        "RemoteStartTransaction echoed from charge point"
    );
    Ok(json!({ "status": "Accepted" }))
}

pub async fn handle_remote_stop(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        transaction_id = ?field_i32(payload, "transactionId"),
        "RemoteStopTransaction echoed from charge point"
    );
    Ok(json!({ "status": "Accepted" }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn echoes_are_accepted() {
        let f = fixture("CP001");
        for (action, payload) in [
            ("TriggerMessage", json!({"requestedMessage": "Heartbeat"})),
            ("RemoteStartTransaction", json!({"idTag": "T"})),
            ("RemoteStopTransaction", json!({"transactionId": 3})),
        ] {
            let response = call(&f.handler, action, payload).await;
            assert_eq!(result_payload(&response)["status"], "Accepted");
        }
    }
}
