//! System-wide key/value configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfigEntry {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SystemConfigEntry {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: Some(description.into()),
            updated_at: Utc::now(),
        }
    }

    pub fn value_as_u32(&self) -> Option<u32> {
        self.value.trim().parse().ok()
    }
}

/// Keys seeded on first start.
pub mod keys {
    pub const HEARTBEAT_INTERVAL: &str = "heartbeat_interval";
    pub const METER_VALUE_INTERVAL: &str = "meter_value_interval";
    pub const CONNECTION_TIMEOUT: &str = "connection_timeout";
    pub const MAX_RETRIES: &str = "max_retries";
    pub const RETRY_INTERVAL: &str = "retry_interval";
}

/// The default rows written when the table is empty.
pub fn default_entries() -> Vec<SystemConfigEntry> {
    vec![
        SystemConfigEntry::new(
            keys::HEARTBEAT_INTERVAL,
            "60",
            "Default heartbeat interval in seconds",
        ),
        SystemConfigEntry::new(
            keys::METER_VALUE_INTERVAL,
            "60",
            "Default meter value interval in seconds",
        ),
        SystemConfigEntry::new(
            keys::CONNECTION_TIMEOUT,
            "30",
            "Connection timeout in seconds",
        ),
        SystemConfigEntry::new(
            keys::MAX_RETRIES,
            "3",
            "Maximum retry attempts for failed messages",
        ),
        SystemConfigEntry::new(keys::RETRY_INTERVAL, "5", "Retry interval in seconds"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_keys() {
        let entries = default_entries();
        for key in [
            keys::HEARTBEAT_INTERVAL,
            keys::METER_VALUE_INTERVAL,
            keys::CONNECTION_TIMEOUT,
            keys::MAX_RETRIES,
            keys::RETRY_INTERVAL,
        ] {
            assert!(entries.iter().any(|e| e.key == key), "missing {key}");
        }
    }

    #[test]
    fn numeric_parse() {
        let entry = SystemConfigEntry::new("heartbeat_interval", "60", "");
        assert_eq!(entry.value_as_u32(), Some(60));
        let entry = SystemConfigEntry::new("k", "not a number", "");
        assert_eq!(entry.value_as_u32(), None);
    }
}
