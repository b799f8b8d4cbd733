//! ClearChargingProfile command

use serde_json::json;

use crate::support::errors::DomainResult;

use super::OutboundCall;

#[derive(Debug, Clone, Default)]
pub struct ClearChargingProfile {
    pub connector_id: Option<i32>,
    pub charging_profile_id: Option<i32>,
}

impl ClearChargingProfile {
    pub const ACTION: &'static str = "ClearChargingProfile";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        let mut payload = json!({});
        if let Some(id) = self.charging_profile_id {
            payload["id"] = json!(id);
        }
        if let Some(connector_id) = self.connector_id {
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
    fn empty_clears_all() {
        let call = ClearChargingProfile::default().build().unwrap();
        assert!(call.payload.as_object().unwrap().is_empty());
    }
}
