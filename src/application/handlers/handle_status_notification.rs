//! StatusNotification handler

use serde_json::{json, Value};

use crate::application::events::{Event, StatusNotificationEvent};
use crate::support::errors::DomainResult;

use super::{field_i32, field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let connector_id = field_i32(payload, "connectorId").unwrap_or(0);
    let status = field_str(payload, "status").unwrap_or_else(|| "Unknown".to_string());
    let error_code = field_str(payload, "errorCode");
    let info = field_str(payload, "info");

    handler
        .service
        .apply_status_notification(&handler.charger_id, connector_id, &status, error_code.clone())
        .await?;

    handler
        .event_bus
        .publish(Event::StatusNotification(StatusNotificationEvent {
            charger_id: handler.charger_id.clone(),
            connector_id,
            status,
            error_code,
            info,
        }));

    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn status_updates_connector() {
        let f = fixture("CP001");
        let response = call(
            &f.handler,
            "StatusNotification",
            json!({
                "connectorId": 1,
                "status": "Available",
                "errorCode": "NoError",
            }),
        )
        .await;
        assert!(result_payload(&response).as_object().unwrap().is_empty());

        let connector = f
            .handler
            .service
            .repos()
            .connectors()
            .find("CP001", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connector.status, "Available");
        assert_eq!(connector.error_code.as_deref(), Some("NoError"));
    }

    #[tokio::test]
    async fn missing_connector_id_defaults_to_station() {
        let f = fixture("CP001");
        call(
            &f.handler,
            "StatusNotification",
            json!({"status": "Faulted", "errorCode": "GroundFailure"}),
        )
        .await;
        assert!(f
            .handler
            .service
            .repos()
            .connectors()
            .find("CP001", 0)
            .await
            .unwrap()
            .is_some());
    }
}
