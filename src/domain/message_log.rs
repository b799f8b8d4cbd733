//! Append-only OCPP message log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDirection {
    /// CP -> CS
    In,
    /// CS -> CP
    Out,
    /// Envelope forwarded to master observers
    Forward,
}

impl LogDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Forward => "FORWARD",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "OUT" => Self::Out,
            "FORWARD" => Self::Forward,
            _ => Self::In,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    Success,
    Error,
    Pending,
    Timeout,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Pending => "Pending",
            Self::Timeout => "Timeout",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Error" => Self::Error,
            "Pending" => Self::Pending,
            "Timeout" => Self::Timeout,
            _ => Self::Success,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLog {
    pub id: i32,
    pub charger_id: String,
    pub direction: LogDirection,
    pub action: String,
    pub message_id: Option<String>,
    pub status: LogStatus,
    pub processing_time_ms: Option<f64>,
    pub request: Option<String>,
    pub response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MessageLog {
    pub fn new(
        charger_id: impl Into<String>,
        direction: LogDirection,
        action: impl Into<String>,
        message_id: Option<String>,
        status: LogStatus,
    ) -> Self {
        Self {
            id: 0,
            charger_id: charger_id.into(),
            direction,
            action: action.into(),
            message_id,
            status,
            processing_time_ms: None,
            request: None,
            response: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_processing_time(mut self, ms: f64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_and_status_roundtrip() {
        for d in [LogDirection::In, LogDirection::Out, LogDirection::Forward] {
            assert_eq!(LogDirection::parse(d.as_str()), d);
        }
        for s in [
            LogStatus::Success,
            LogStatus::Error,
            LogStatus::Pending,
            LogStatus::Timeout,
        ] {
            assert_eq!(LogStatus::parse(s.as_str()), s);
        }
    }

    #[test]
    fn builder_fills_optionals() {
        let log = MessageLog::new("CP001", LogDirection::In, "Heartbeat", Some("h1".into()), LogStatus::Success)
            .with_processing_time(1.25)
            .with_request("{}")
            .with_response("{}");
        assert_eq!(log.processing_time_ms, Some(1.25));
        assert!(log.request.is_some());
        assert!(log.response.is_some());
    }
}
