//! ChangeConfiguration command
//!
//! The one action that queues while its charger is disconnected: the retry
//! engine keeps the pending and delivers it on reconnect.

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

/// OCPP 1.6 CiString limits for configuration keys and values.
const MAX_KEY_LEN: usize = 50;
const MAX_VALUE_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct ChangeConfiguration {
    pub key: String,
    pub value: String,
}

impl ChangeConfiguration {
    pub const ACTION: &'static str = "ChangeConfiguration";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.key.is_empty() || self.key.len() > MAX_KEY_LEN {
            return Err(DomainError::Validation(format!(
                "key must be 1..={MAX_KEY_LEN} characters"
            )));
        }
        if self.value.len() > MAX_VALUE_LEN {
            return Err(DomainError::Validation(format!(
                "value must be at most {MAX_VALUE_LEN} characters"
            )));
        }
        Ok(OutboundCall {
            action: Self::ACTION,
            payload: json!({ "key": self.key, "value": self.value }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds() {
        let call = ChangeConfiguration {
            key: "HeartbeatInterval".into(),
            value: "300".into(),
        }
        .build()
        .unwrap();
        assert_eq!(call.payload["key"], "HeartbeatInterval");
        assert_eq!(call.payload["value"], "300");
    }

    #[test]
    fn enforces_cistring_limits() {
        assert!(ChangeConfiguration {
            key: "k".repeat(51),
            value: "v".into(),
        }
        .build()
        .is_err());
        assert!(ChangeConfiguration {
            key: "k".into(),
            value: "v".repeat(501),
        }
        .build()
        .is_err());
    }
}
