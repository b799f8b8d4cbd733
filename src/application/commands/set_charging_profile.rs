//! SetChargingProfile command

use serde_json::{json, Value};

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

/// The charging profile is passed through as JSON; the charge point is the
/// authority on its internal consistency.
#[derive(Debug, Clone)]
pub struct SetChargingProfile {
    pub connector_id: i32,
    pub charging_profile: Value,
}

impl SetChargingProfile {
    pub const ACTION: &'static str = "SetChargingProfile";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.connector_id < 0 {
            return Err(DomainError::Validation("connectorId must be >= 0".into()));
        }
        if !self.charging_profile.is_object() {
            return Err(DomainError::Validation(
                "chargingProfile must be an object".into(),
            ));
        }
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({
                "connectorId": self.connector_id,
                "csChargingProfiles": self.charging_profile,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_must_be_object() {
        assert!(SetChargingProfile {
            connector_id: 1,
            charging_profile: json!("not an object"),
        }
        .build()
        .is_err());
        assert!(SetChargingProfile {
            connector_id: 1,
            charging_profile: json!({"chargingProfileId": 1}),
        }
        .build()
        .is_ok());
    }
}
