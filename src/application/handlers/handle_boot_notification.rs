//! BootNotification handler

use chrono::Utc;
use serde_json::{json, Value};

use crate::application::events::{BootNotificationEvent, Event};
use crate::support::errors::DomainResult;

use super::{field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let vendor = field_str(payload, "chargePointVendor");
    let model = field_str(payload, "chargePointModel");
    let serial_number = field_str(payload, "chargePointSerialNumber");
    let firmware_version = field_str(payload, "firmwareVersion");

    let interval = handler
        .service
        .handle_boot(
            &handler.charger_id,
            vendor.clone(),
            model.clone(),
            serial_number.clone(),
            firmware_version.clone(),
        )
        .await?;

    handler
        .event_bus
        .publish(Event::BootNotification(BootNotificationEvent {
            charger_id: handler.charger_id.clone(),
            vendor,
            model,
            serial_number,
            firmware_version,
        }));

    Ok(json!({
        "currentTime": Utc::now(),
        "interval": interval,
        "status": "Accepted",
    }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn boot_persists_fields_and_accepts() {
        let f = fixture("CP001");
        let response = call(
            &f.handler,
            "BootNotification",
            json!({
                "chargePointVendor": "VendorX",
                "chargePointModel": "ModelY",
                "firmwareVersion": "1.2.3",
            }),
        )
        .await;

        let payload = result_payload(&response);
        assert_eq!(payload["status"], "Accepted");
        assert_eq!(payload["interval"], 60);
        assert!(payload["currentTime"].is_string());

        let charger = f
            .handler
            .service
            .repos()
            .chargers()
            .find_by_id("CP001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(charger.vendor.as_deref(), Some("VendorX"));
        assert_eq!(charger.model.as_deref(), Some("ModelY"));
        assert_eq!(charger.firmware_version.as_deref(), Some("1.2.3"));
    }

    #[tokio::test]
    async fn boot_is_idempotent() {
        let f = fixture("CP001");
        let payload = json!({
            "chargePointVendor": "V",
            "chargePointModel": "M",
        });
        call(&f.handler, "BootNotification", payload.clone()).await;
        let before = f
            .handler
            .service
            .repos()
            .chargers()
            .find_by_id("CP001")
            .await
            .unwrap()
            .unwrap();

        call(&f.handler, "BootNotification", payload).await;
        let after = f
            .handler
            .service
            .repos()
            .chargers()
            .find_by_id("CP001")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(before.vendor, after.vendor);
        assert_eq!(before.model, after.model);
        assert_eq!(before.serial_number, after.serial_number);
    }
}
