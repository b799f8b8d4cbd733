//! GetConfiguration command

use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone, Default)]
pub struct GetConfiguration {
    /// Keys to read; empty requests the full configuration.
    pub keys: Vec<String>,
}

impl GetConfiguration {
    pub const ACTION: &'static str = "GetConfiguration";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        for key in &self.keys {
            if key.is_empty() || key.len() > 50 {
                return Err(DomainError::Validation(
                    "each key must be 1..=50 characters".into(),
                ));
            }
        }
        let payload = if self.keys.is_empty() {
            json!({})
        } else {
            json!({ "key": self.keys })
        };
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
    fn empty_keys_request_everything() {
        let call = GetConfiguration::default().build().unwrap();
        assert!(call.payload.as_object().unwrap().is_empty());
    }

    #[test]
    fn keys_are_bounded() {
        assert!(GetConfiguration {
            keys: vec!["k".repeat(51)],
        }
        .build()
        .is_err());
    }
}
