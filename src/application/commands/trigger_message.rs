//! TriggerMessage command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

/// Messages the central system may ask a charge point to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMessageKind {
    BootNotification,
    DiagnosticsStatusNotification,
    FirmwareStatusNotification,
    Heartbeat,
    MeterValues,
    StatusNotification,
}

impl TriggerMessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BootNotification => "BootNotification",
            Self::DiagnosticsStatusNotification => "DiagnosticsStatusNotification",
            Self::FirmwareStatusNotification => "FirmwareStatusNotification",
            Self::Heartbeat => "Heartbeat",
            Self::MeterValues => "MeterValues",
            Self::StatusNotification => "StatusNotification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BootNotification" => Some(Self::BootNotification),
            "DiagnosticsStatusNotification" => Some(Self::DiagnosticsStatusNotification),
            "FirmwareStatusNotification" => Some(Self::FirmwareStatusNotification),
            "Heartbeat" => Some(Self::Heartbeat),
            "MeterValues" => Some(Self::MeterValues),
            "StatusNotification" => Some(Self::StatusNotification),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerMessage {
    pub requested_message: TriggerMessageKind,
    pub connector_id: Option<i32>,
}

impl TriggerMessage {
    pub const ACTION: &'static str = "TriggerMessage";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        let mut payload = json!({ "requestedMessage": self.requested_message.as_str() });
        if let Some(connector_id) = self.connector_id {
            if connector_id < 1 {
                return Err(DomainError::Validation("connectorId must be >= 1".into()));
            }
            payload["connectorId"] = json!(connector_id);
        }
        Ok(OutboundCall {
            action: Self::ACTION,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            TriggerMessageKind::BootNotification,
            TriggerMessageKind::DiagnosticsStatusNotification,
            TriggerMessageKind::FirmwareStatusNotification,
            TriggerMessageKind::Heartbeat,
            TriggerMessageKind::MeterValues,
            TriggerMessageKind::StatusNotification,
        ] {
            assert_eq!(TriggerMessageKind::parse(kind.as_str()), Some(kind));
        }
        assert!(TriggerMessageKind::parse("SignedMeterValues").is_none());
    }

    #[test]
    fn builds_with_connector() {
        let call = TriggerMessage {
            requested_message: TriggerMessageKind::Heartbeat,
            connector_id: Some(1),
        }
        .build()
        .unwrap();
        assert_eq!(call.payload["requestedMessage"], "Heartbeat");
        assert_eq!(call.payload["connectorId"], 1);
    }
}
