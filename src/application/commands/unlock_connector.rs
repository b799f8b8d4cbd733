//! UnlockConnector command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone)]
pub struct UnlockConnector {
    pub connector_id: i32,
}

impl UnlockConnector {
    pub const ACTION: &'static str = "UnlockConnector";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.connector_id < 1 {
            return Err(DomainError::Validation("connectorId must be >= 1".into()));
        }
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({ "connectorId": self.connector_id }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_station_connector() {
        assert!(UnlockConnector { connector_id: 0 }.build().is_err());
        assert!(UnlockConnector { connector_id: 1 }.build().is_ok());
    }
}
