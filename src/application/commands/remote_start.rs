//! RemoteStartTransaction command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

/// Start a charging transaction remotely.
#[derive(Debug, Clone)]
pub struct RemoteStartTransaction {
    pub id_tag: String,
    pub connector_id: Option<i32>,
}

impl RemoteStartTransaction {
    pub const ACTION: &'static str = "RemoteStartTransaction";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.id_tag.is_empty() {
            return Err(DomainError::Validation("idTag must not be empty".into()));
        }
        if self.id_tag.len() > 20 {
            return Err(DomainError::Validation(
                "idTag must be at most 20 characters".into(),
            ));
        }

        let mut payload = json!({ "idTag": self.id_tag });
        if let Some(connector_id) = self.connector_id {
            if connector_id < 1 {
                return Err(DomainError::Validation(
                    "connectorId must be >= 1".into(),
                ));
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
    fn builds_with_connector() {
        let call = RemoteStartTransaction {
            id_tag: "TAG-1".into(),
            connector_id: Some(1),
        }
        .build()
        .unwrap();
        assert_eq!(call.action, "RemoteStartTransaction");
        assert_eq!(call.payload["idTag"], "TAG-1");
        assert_eq!(call.payload["connectorId"], 1);
    }

    #[test]
    fn rejects_empty_tag() {
        assert!(RemoteStartTransaction {
            id_tag: String::new(),
            connector_id: None,
        }
        .build()
        .is_err());
    }

    #[test]
    fn rejects_connector_zero() {
        assert!(RemoteStartTransaction {
            id_tag: "T".into(),
            connector_id: Some(0),
        }
        .build()
        .is_err());
    }
}
