//! GetDiagnostics command

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::support::errors::{DomainError, DomainResult};

use super::OutboundCall;

#[derive(Debug, Clone)]
pub struct GetDiagnostics {
    /// Upload target (e.g. an FTP or HTTPS URL).
    pub location: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
}

impl GetDiagnostics {
    pub const ACTION: &'static str = "GetDiagnostics";

    pub fn build(&self) -> DomainResult<OutboundCall> {
        if self.location.is_empty() {
            return Err(DomainError::Validation("location must not be empty".into()));
        }

        let mut payload = json!({ "location": self.location });
        if let Some(t) = self.start_time {
            payload["startTime"] = json!(t);
        }
        if let Some(t) = self.stop_time {
            payload["stopTime"] = json!(t);
        }
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
    fn location_required() {
        assert!(GetDiagnostics {
            location: String::new(),
            start_time: None,
            stop_time: None,
            retries: None,
            retry_interval: None,
        }
        .build()
        .is_err());
    }
}
