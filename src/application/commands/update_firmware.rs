//! UpdateFirmware command

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone)]
pub struct UpdateFirmware {
    /// Firmware image URL.
    pub location: String,
    pub retrieve_date: DateTime<Utc>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
}

impl UpdateFirmware {
    pub const ACTION: &'static str = "UpdateFirmware";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.location.is_empty() {
            return Err(DomainError::Validation("location must not be empty".into()));
        }

        let mut payload = json!({
            "location": self.location,
            "retrieveDate": self.retrieve_date,
        });
        if let Some(n) = self.retries {
            payload["retries"] = json!(n);
        }
        if let Some(n) = self.retry_interval {
            payload["retryInterval"] = json!(n);
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
    fn builds_with_retrieve_date() {
        let call = UpdateFirmware {
            location: "https://firmware.example/v2.bin".into(),
            retrieve_date: Utc::now(),
            retries: Some(3),
            retry_interval: None,
        }
        .build()
        .unwrap();
        assert!(call.payload["retrieveDate"].is_string());
        assert_eq!(call.payload["retries"], 3);
    }
}
