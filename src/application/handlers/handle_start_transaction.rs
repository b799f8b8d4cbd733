//! StartTransaction handler

use serde_json::{json, Value};

use crate::application::events::{Event, TransactionStartedEvent};
use crate::support::errors::DomainResult;

use super::{field_f64, field_i32, field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let connector_id = field_i32(payload, "connectorId").unwrap_or(0);
    let id_tag = field_str(payload, "idTag");
    let meter_start = field_f64(payload, "meterStart").unwrap_or(0.0);

    let session = handler
        .service
        .start_transaction(&handler.charger_id, connector_id, id_tag.clone(), meter_start)
        .await?;
    let transaction_id = session.transaction_id.unwrap_or(0);

    handler
        .event_bus
        .publish(Event::TransactionStarted(TransactionStartedEvent {
            charger_id: handler.charger_id.clone(),
            session_id: session.id,
            transaction_id,
            connector_id,
            id_tag,
            meter_start,
            start_time: session.start_time,
        }));

    Ok(json!({
        "transactionId": transaction_id,
        "idTagInfo": { "status": "Accepted" },
    }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn successive_starts_return_increasing_ids() {
        let f = fixture("CP001");
        let mut previous = 0;
        for _ in 0..3 {
            let response = call(
                &f.handler,
                "StartTransaction",
                json!({"connectorId": 1, "idTag": "T", "meterStart": 1000}),
            )
            .await;
            let payload = result_payload(&response);
            assert_eq!(payload["idTagInfo"]["status"], "Accepted");
            let id = payload["transactionId"].as_i64().unwrap();
            assert!(id > previous, "{id} not > {previous}");
            previous = id;
        }
    }

    #[tokio::test]
    async fn null_meter_start_is_tolerated() {
        let f = fixture("CP001");
        let response = call(
            &f.handler,
            "StartTransaction",
            json!({"connectorId": 1, "idTag": "T", "meterStart": null}),
        )
        .await;
        assert_eq!(result_payload(&response)["transactionId"], 1);
    }
}
