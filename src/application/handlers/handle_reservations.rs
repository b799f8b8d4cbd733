//! ReserveNow / CancelReservation handlers
//!
//! Reservations are acknowledged but not tracked; the charge point is the
//! authority on its own reservation slots.

use serde_json::{json, Value};
use tracing::info;

use crate::support::errors::DomainResult;

use super::{field_i32, OcppHandler};

pub async fn handle_reserve(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        connector_id = ?field_i32(payload, "connectorId"),
        reservation_id = ?field_i32(payload, "reservationId"),
        "ReserveNow"
    );
    Ok(json!({ "status": "Accepted" }))
}

pub async fn handle_cancel(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    info!(
        charger_id = handler.charger_id.as_str(),
        reservation_id = ?field_i32(payload, "reservationId"),
        "CancelReservation"
    );
    Ok(json!({ "status": "Accepted" }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn reservations_are_acknowledged() {
        let f = fixture("CP001");
        for action in ["ReserveNow", "CancelReservation"] {
            let response = call(&f.handler, action, json!({"reservationId": 5})).await;
            assert_eq!(result_payload(&response)["status"], "Accepted");
        }
    }
}
