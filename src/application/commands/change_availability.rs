//! ChangeAvailability command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityType {
    Operative,
    Inoperative,
}

impl AvailabilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operative => "Operative",
            Self::Inoperative => "Inoperative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Operative" => Some(Self::Operative),
            "Inoperative" => Some(Self::Inoperative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeAvailability {
    pub connector_id: i32,
    pub kind: AvailabilityType,
}

impl ChangeAvailability {
    pub const ACTION: &'static str = "ChangeAvailability";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.connector_id < 0 {
            return Err(DomainError::Validation("connectorId must be >= 0".into()));
        }
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({
                "connectorId": self.connector_id,
                "type": self.kind.as_str(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_kinds() {
        for (kind, s) in [
            (AvailabilityType::Operative, "Operative"),
            (AvailabilityType::Inoperative, "Inoperative"),
        ] {
            let call = ChangeAvailability {
                connector_id: 0,
                kind,
            }
            .build()
            .unwrap();
            assert_eq!(call.payload["type"], s);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(AvailabilityType::parse("Broken").is_none());
    }
}
