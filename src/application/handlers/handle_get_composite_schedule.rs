//! GetCompositeSchedule handler
//!
//! Answers with a synthetic flat schedule starting now; no charging profile
//! engine sits behind this central system.

use chrono::Utc;
use serde_json::{json, Value};

use crate::support::errors::DomainResult;

use super::{field_i32, field_str, OcppHandler};

/// Flat limit of the synthetic schedule, 10 kW.
const SCHEDULE_LIMIT_W: i64 = 10_000;

pub async fn handle(_handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let connector_id = field_i32(payload, "connectorId").unwrap_or(0);
    let charging_rate_unit = field_str(payload, "chargingRateUnit").unwrap_or_else(|| "W".into());

    Ok(json!({
        "status": "Accepted",
        "connectorId": connector_id,
        "scheduleStart": Utc::now(),
        "chargingSchedule": {
            "chargingRateUnit": charging_rate_unit,
            "chargingSchedulePeriod": [
                { "startPeriod": 0, "limit": SCHEDULE_LIMIT_W }
            ],
        },
    }))
}

#[cfg(test)]
mod tests {
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    #[tokio::test]
    async fn synthetic_schedule_shape() {
        let f = fixture("CP001");
        let response = call(
            &f.handler,
            "GetCompositeSchedule",
            json!({"connectorId": 1, "duration": 3600}),
        )
        .await;
        let payload = result_payload(&response);
        assert_eq!(payload["status"], "Accepted");
        assert_eq!(payload["connectorId"], 1);
        let period = &payload["chargingSchedule"]["chargingSchedulePeriod"][0];
        assert_eq!(period["startPeriod"], 0);
        assert_eq!(period["limit"], 10000);
    }
}
