//! Heartbeat handler

use chrono::Utc;
use serde_json::{json, Value};

use crate::application::events::{Event, HeartbeatEvent};
use crate::support::errors::DomainResult;

use super::OcppHandler;

pub async fn handle(handler: &OcppHandler, _payload: &Value) -> DomainResult<Value> {
    if handler.service.record_heartbeat(&handler.charger_id).await.is_err() {
        // No row yet: the CP skipped BootNotification. Register it first.
        handler.service.mark_connected(&handler.charger_id).await?;
        handler.service.record_heartbeat(&handler.charger_id).await?;
    }

    handler
        .event_bus
        .publish(Event::HeartbeatReceived(HeartbeatEvent {
            charger_id: handler.charger_id.clone(),
        }));

    Ok(json!({ "currentTime": Utc::now() }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn heartbeat_advances_timestamp() {
        let f = fixture("CP001");
        let response = call(&f.handler, "Heartbeat", json!({})).await;
        assert!(result_payload(&response)["currentTime"].is_string());

        let charger = f
            .handler
            .service
            .repos()
            .chargers()
            .find_by_id("CP001")
            .await
            .unwrap()
            .unwrap();
        assert!(charger.last_heartbeat.is_some());
        assert!(charger.is_connected);
    }
}
