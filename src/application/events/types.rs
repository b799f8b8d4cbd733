//! Event types broadcast on the bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protocol and lifecycle events published by the handlers and the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ChargerConnected(ChargerConnectedEvent),
    ChargerDisconnected(ChargerDisconnectedEvent),
    BootNotification(BootNotificationEvent),
    HeartbeatReceived(HeartbeatEvent),
    StatusNotification(StatusNotificationEvent),
    MeterValuesReceived(MeterValuesEvent),
    TransactionStarted(TransactionStartedEvent),
    TransactionStopped(TransactionStoppedEvent),
    RemoteCommandResult(RemoteCommandResultEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ChargerConnected(_) => "charger_connected",
            Event::ChargerDisconnected(_) => "charger_disconnected",
            Event::BootNotification(_) => "boot_notification",
            Event::HeartbeatReceived(_) => "heartbeat",
            Event::StatusNotification(_) => "status_notification",
            Event::MeterValuesReceived(_) => "meter_values",
            Event::TransactionStarted(_) => "transaction_start",
            Event::TransactionStopped(_) => "transaction_stop",
            Event::RemoteCommandResult(_) => "remote_command_result",
        }
    }

    pub fn charger_id(&self) -> &str {
        match self {
            Event::ChargerConnected(e) => &e.charger_id,
            Event::ChargerDisconnected(e) => &e.charger_id,
            Event::BootNotification(e) => &e.charger_id,
            Event::HeartbeatReceived(e) => &e.charger_id,
            Event::StatusNotification(e) => &e.charger_id,
            Event::MeterValuesReceived(e) => &e.charger_id,
            Event::TransactionStarted(e) => &e.charger_id,
            Event::TransactionStopped(e) => &e.charger_id,
            Event::RemoteCommandResult(e) => &e.charger_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerConnectedEvent {
    pub charger_id: String,
    pub connection_id: String,
    pub remote_address: Option<String>,
    pub subprotocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerDisconnectedEvent {
    pub charger_id: String,
    pub connection_id: Option<String>,
    pub reason: Option<String>,
    pub session_duration_s: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootNotificationEvent {
    pub charger_id: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub charger_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusNotificationEvent {
    pub charger_id: String,
    pub connector_id: i32,
    pub status: String,
    pub error_code: Option<String>,
    pub info: Option<String>,
}

impl StatusNotificationEvent {
    /// StatusNotifications carrying a real error code double as faults.
    pub fn is_fault(&self) -> bool {
        self.error_code
            .as_deref()
            .map(|c| !c.is_empty() && c != "NoError")
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterValuesEvent {
    pub charger_id: String,
    pub connector_id: i32,
    pub transaction_id: Option<i32>,
    /// kWh, from Energy.Active.Import.Register
    pub energy_kwh: Option<f64>,
    /// kW, from Power.Active.Import
    pub power_kw: Option<f64>,
    pub voltage: Option<f64>,
    pub current_a: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStartedEvent {
    pub charger_id: String,
    pub session_id: i32,
    pub transaction_id: i32,
    pub connector_id: i32,
    pub id_tag: Option<String>,
    pub meter_start: f64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStoppedEvent {
    pub charger_id: String,
    pub session_id: i32,
    pub transaction_id: i32,
    pub connector_id: Option<i32>,
    pub id_tag: Option<String>,
    pub meter_stop: f64,
    pub energy_delivered_kwh: f64,
    pub cost: f64,
    pub duration_s: Option<i64>,
    pub stop_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCommandResultEvent {
    pub charger_id: String,
    pub command: String,
    pub message_id: String,
    /// success, call_error, timeout, exhausted, disconnected
    pub status: String,
    pub response: Option<serde_json::Value>,
}

/// Wrapper carrying per-event metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_detection() {
        let mut event = StatusNotificationEvent {
            charger_id: "CP1".into(),
            connector_id: 1,
            status: "Faulted".into(),
            error_code: Some("GroundFailure".into()),
            info: None,
        };
        assert!(event.is_fault());
        event.error_code = Some("NoError".into());
        assert!(!event.is_fault());
        event.error_code = None;
        assert!(!event.is_fault());
    }

    #[test]
    fn event_type_names_match_sink_enumeration() {
        let event = Event::TransactionStarted(TransactionStartedEvent {
            charger_id: "CP1".into(),
            session_id: 1,
            transaction_id: 1,
            connector_id: 1,
            id_tag: None,
            meter_start: 0.0,
            start_time: Utc::now(),
        });
        assert_eq!(event.event_type(), "transaction_start");
        assert_eq!(event.charger_id(), "CP1");
    }
}
