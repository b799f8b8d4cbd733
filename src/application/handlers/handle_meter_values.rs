//! MeterValues handler
//!
//! Persists the energy register on the connector and forwards the live
//! electrical readings (power, voltage, current) to the projection.

use serde_json::{json, Value};

use crate::application::events::{Event, MeterValuesEvent};
use crate::support::errors::DomainResult;

use super::{field_i32, OcppHandler};

/// Readings extracted from one MeterValues payload (last sample of each
/// measurand wins).
#[derive(Debug, Default, PartialEq)]
struct Readings {
    energy_kwh: Option<f64>,
    power_kw: Option<f64>,
    voltage: Option<f64>,
    current_a: Option<f64>,
}

fn sample_value(sample: &Value) -> Option<f64> {
    let value = sample.get("value")?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

/// Walk meterValue[].sampledValue[] tolerantly; unknown measurands are
/// ignored, a missing measurand defaults to the energy register per OCPP.
fn extract_readings(payload: &Value) -> Readings {
    let mut readings = Readings::default();

    let Some(meter_values) = payload.get("meterValue").and_then(|v| v.as_array()) else {
        return readings;
    };

    for meter_value in meter_values {
        let Some(samples) = meter_value.get("sampledValue").and_then(|v| v.as_array()) else {
            continue;
        };
        for sample in samples {
            let Some(value) = sample_value(sample) else {
                continue;
            };
            let measurand = sample
                .get("measurand")
                .and_then(|v| v.as_str())
                .unwrap_or("Energy.Active.Import.Register");
            match measurand {
                "Energy.Active.Import.Register" => readings.energy_kwh = Some(value / 1000.0),
                "Power.Active.Import" => readings.power_kw = Some(value / 1000.0),
                "Voltage" => readings.voltage = Some(value),
                "Current.Import" => readings.current_a = Some(value),
                _ => {}
            }
        }
    }

    readings
}

pub async fn handle(handler: &OcppHandler, payload: &Value) -> DomainResult<Value> {
    let connector_id = field_i32(payload, "connectorId").unwrap_or(0);
    let transaction_id = field_i32(payload, "transactionId");
    let readings = extract_readings(payload);

    if readings.energy_kwh.is_some() || readings.power_kw.is_some() {
        handler
            .service
            .apply_meter_sample(
                &handler.charger_id,
                connector_id,
                readings.energy_kwh,
                readings.power_kw,
            )
            .await?;
    }

    handler
        .event_bus
        .publish(Event::MeterValuesReceived(MeterValuesEvent {
            charger_id: handler.charger_id.clone(),
            connector_id,
            transaction_id,
            energy_kwh: readings.energy_kwh,
            power_kw: readings.power_kw,
            voltage: readings.voltage,
            current_a: readings.current_a,
        }));

    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use serde_json::json;

    fn meter_payload(samples: Value) -> Value {
        json!({
            "connectorId": 1,
            "transactionId": 1,
            "meterValue": [{ "timestamp": "2024-01-01T00:00:00Z", "sampledValue": samples }],
        })
    }

    #[test]
    fn extracts_all_measurands() {
        let payload = meter_payload(json!([
            {"value": "2500", "measurand": "Energy.Active.Import.Register", "unit": "Wh"},
            {"value": "7400", "measurand": "Power.Active.Import", "unit": "W"},
            {"value": "230.1", "measurand": "Voltage"},
            {"value": "32", "measurand": "Current.Import"},
            {"value": "55", "measurand": "SoC"},
        ]));
        let readings = extract_readings(&payload);
        assert_eq!(readings.energy_kwh, Some(2.5));
        assert_eq!(readings.power_kw, Some(7.4));
        assert_eq!(readings.voltage, Some(230.1));
        assert_eq!(readings.current_a, Some(32.0));
    }

    #[test]
    fn missing_measurand_defaults_to_energy() {
        let payload = meter_payload(json!([{"value": "1500"}]));
        assert_eq!(extract_readings(&payload).energy_kwh, Some(1.5));
    }

    #[tokio::test]
    async fn last_energy_sample_wins_on_connector() {
        let f = fixture("CP001");
        for wh in ["1200", "1800", "2500"] {
            call(
                &f.handler,
                "MeterValues",
                meter_payload(json!([
                    {"value": wh, "measurand": "Energy.Active.Import.Register"}
                ])),
            )
            .await;
        }

        let connector = f
            .handler
            .service
            .repos()
            .connectors()
            .find("CP001", 1)
            .await
            .unwrap()
            .unwrap();
        assert!((connector.energy_delivered_kwh - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_meter_values_still_accepted() {
        let f = fixture("CP001");
        let response = call(&f.handler, "MeterValues", json!({"connectorId": 1})).await;
        assert!(result_payload(&response).as_object().unwrap().is_empty());
    }
}
