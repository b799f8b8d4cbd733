//! StopTransaction handler

use serde_json::{json, Value};

use crate::application::events::{Event, TransactionStoppedEvent};
use crate::support::errors::DomainResult;

use super::{field_f64, field_i32, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let transaction_id = field_i32(payload, "transactionId").unwrap_or(0);
    let meter_stop = field_f64(payload, "meterStop").unwrap_or(0.0);

    if let Some(session) = handler
        .service
        .stop_transaction(&handler.charger_id, transaction_id, meter_stop)
        .await?
    {
        handler
            .event_bus
            .publish(Event::TransactionStopped(TransactionStoppedEvent {
                charger_id: handler.charger_id.clone(),
                session_id: session.id,
                transaction_id,
                connector_id: session.connector_id,
                id_tag: session.id_tag.clone(),
                meter_stop,
                energy_delivered_kwh: session.energy_delivered_kwh,
                cost: session.cost,
                duration_s: session.duration_s,
                stop_time: session.stop_time,
            }));
    }

    // An unknown transaction id is still acknowledged; the CP has already
    // stopped charging and retrying would change nothing.
    Ok(json!({ "idTagInfo": { "status": "Accepted" } }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use crate::domain::session::SessionStatus;
    use serde_json::json;

    #[tokio::test]
    async fn full_session_computes_energy_and_cost() {
        let f = fixture("CP001");
        call(
            &f.handler,
            "StartTransaction",
            json!({"connectorId": 1, "idTag": "T", "meterStart": 1000}),
        )
        .await;
        let response = call(
            &f.handler,
            "StopTransaction",
            json!({"transactionId": 1, "meterStop": 2500}),
        )
        .await;
        assert_eq!(result_payload(&response)["idTagInfo"]["status"], "Accepted");

        let session = f
            .handler
            .service
            .repos()
            .sessions()
            .find_by_transaction("CP001", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!((session.energy_delivered_kwh - 1.5).abs() < 1e-9);
        assert!((session.cost - 0.225).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_transaction_still_accepted() {
        let f = fixture("CP001");
        let response = call(
            &f.handler,
            "StopTransaction",
            json!({"transactionId": 404, "meterStop": 100}),
        )
        .await;
        assert_eq!(result_payload(&response)["idTagInfo"]["status"], "Accepted");
    }
}
