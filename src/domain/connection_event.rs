//! Append-only WebSocket connection event log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionEventType {
    Connect,
    Disconnect,
    Timeout,
    Reconnect,
}

impl ConnectionEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Timeout => "TIMEOUT",
            Self::Reconnect => "RECONNECT",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CONNECT" => Self::Connect,
            "TIMEOUT" => Self::Timeout,
            "RECONNECT" => Self::Reconnect,
            _ => Self::Disconnect,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub id: i32,
    pub charger_id: String,
    pub event_type: ConnectionEventType,
    /// UUID assigned per CP socket.
    pub connection_id: Option<String>,
    pub remote_address: Option<String>,
    pub subprotocol: Option<String>,
    pub reason: Option<String>,
    /// Connection duration in seconds (DISCONNECT / TIMEOUT events).
    pub session_duration_s: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl ConnectionEvent {
    pub fn new(charger_id: impl Into<String>, event_type: ConnectionEventType) -> Self {
        Self {
            id: 0,
            charger_id: charger_id.into(),
            event_type,
            connection_id: None,
            remote_address: None,
            subprotocol: None,
            reason: None,
            session_duration_s: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    pub fn with_remote_address(mut self, addr: impl Into<String>) -> Self {
        self.remote_address = Some(addr.into());
        self
    }

    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.session_duration_s = Some(seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_roundtrip() {
        for t in [
            ConnectionEventType::Connect,
            ConnectionEventType::Disconnect,
            ConnectionEventType::Timeout,
            ConnectionEventType::Reconnect,
        ] {
            assert_eq!(ConnectionEventType::parse(t.as_str()), t);
        }
    }
}
