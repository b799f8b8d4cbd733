//! DataTransfer handler
//!
//! Vendor pass-through. Some stations put double-quoted rather than escaped
//! JSON in the `data` string; the message is accepted either way and the raw
//! string forwarded untouched.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::support::errors::DomainResult;

use super::{field_str, OcppHandler};

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let vendor_id = field_str(payload, "vendorId");
    let message_id = field_str(payload, "messageId");
    let data = payload.get("data");

    if let Some(Value::String(raw)) = data {
        match serde_json::from_str::<Value>(raw) {
            Ok(_) => info!(
                charger_id = handler.charger_id.as_str(),
                vendor_id = ?vendor_id,
                message_id = ?message_id,
                "DataTransfer with JSON data"
            ),
            Err(e) => warn!(
                charger_id = handler.charger_id.as_str(),
                vendor_id = ?vendor_id,
                error = %e,
                "DataTransfer data is not valid JSON, accepting anyway"
            ),
        }
    }

    Ok(json!({ "status": "Accepted" }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn accepts_valid_and_malformed_data() {
        let f = fixture("CP001");
        for data in [
            json!({"vendorId": "V", "data": "{\"ok\":true}"}),
            json!({"vendorId": "V", "data": "{not json]"}),
            json!({"vendorId": "V", "data": {"nested": "object"}}),
            json!({"vendorId": "V"}),
        ] {
            let response = call(&f.handler, "DataTransfer", data).await;
            assert_eq!(result_payload(&response)["status"], "Accepted");
        }
    }
}
