//! Charger (charge point) domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Charger status as reported by StatusNotification on connector 0, or
/// derived from the connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargerStatus {
    Unknown,
    Available,
    Preparing,
    Charging,
    #[serde(rename = "SuspendedEVSE")]
    SuspendedEvse,
    #[serde(rename = "SuspendedEV")]
    SuspendedEv,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
    Offline,
}

impl ChargerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Available => "Available",
            Self::Preparing => "Preparing",
            Self::Charging => "Charging",
            Self::SuspendedEvse => "SuspendedEVSE",
            Self::SuspendedEv => "SuspendedEV",
            Self::Finishing => "Finishing",
            Self::Reserved => "Reserved",
            Self::Unavailable => "Unavailable",
            Self::Faulted => "Faulted",
            Self::Offline => "Offline",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Preparing" => Self::Preparing,
            "Charging" => Self::Charging,
            "SuspendedEVSE" => Self::SuspendedEvse,
            "SuspendedEV" => Self::SuspendedEv,
            "Finishing" => Self::Finishing,
            "Reserved" => Self::Reserved,
            "Unavailable" => Self::Unavailable,
            "Faulted" => Self::Faulted,
            "Offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }
}

/// Per-charger outbound retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts (1..=10).
    pub max_retries: u32,
    /// Seconds between attempts (1..=60).
    pub retry_interval_s: u32,
    pub enabled: bool,
}

impl RetryPolicy {
    pub const MAX_RETRIES_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
    pub const RETRY_INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 1..=60;

    pub fn validate(&self) -> Result<(), String> {
        if !Self::MAX_RETRIES_RANGE.contains(&self.max_retries) {
            return Err(format!(
                "max_retries must be within {:?}, got {}",
                Self::MAX_RETRIES_RANGE,
                self.max_retries
            ));
        }
        if !Self::RETRY_INTERVAL_RANGE.contains(&self.retry_interval_s) {
            return Err(format!(
                "retry_interval must be within {:?}, got {}",
                Self::RETRY_INTERVAL_RANGE,
                self.retry_interval_s
            ));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval_s: 5,
            enabled: true,
        }
    }
}

/// Charge point registered with the central system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charger {
    /// Charger id from the WebSocket path (opaque string).
    pub id: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,

    pub status: ChargerStatus,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub last_message: Option<String>,

    pub is_connected: bool,
    pub connection_time: Option<DateTime<Utc>>,
    pub disconnect_time: Option<DateTime<Utc>>,

    /// Free-form configuration mirror (key/value pairs reported by the CP).
    pub configuration: serde_json::Value,

    pub retry_policy: RetryPolicy,

    pub site_id: Option<String>,
    pub organization_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Charger {
    /// A charger as first seen on WebSocket upgrade, before any
    /// BootNotification has arrived.
    pub fn unknown(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            vendor: None,
            model: None,
            serial_number: None,
            firmware_version: None,
            status: ChargerStatus::Unknown,
            last_heartbeat: Some(now),
            last_message: None,
            is_connected: true,
            connection_time: Some(now),
            disconnect_time: None,
            configuration: serde_json::Value::Object(Default::default()),
            retry_policy: RetryPolicy::default(),
            site_id: None,
            organization_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a BootNotification payload's descriptive fields.
    pub fn apply_boot(
        &mut self,
        vendor: Option<String>,
        model: Option<String>,
        serial_number: Option<String>,
        firmware_version: Option<String>,
    ) {
        self.vendor = vendor;
        self.model = model;
        self.serial_number = serial_number;
        self.firmware_version = firmware_version;
        self.updated_at = Utc::now();
    }

    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Seconds since the last heartbeat, if any was seen.
    pub fn seconds_since_heartbeat(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_heartbeat
            .map(|hb| now.signed_duration_since(hb).num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in [
            ChargerStatus::Unknown,
            ChargerStatus::Available,
            ChargerStatus::Preparing,
            ChargerStatus::Charging,
            ChargerStatus::SuspendedEvse,
            ChargerStatus::SuspendedEv,
            ChargerStatus::Finishing,
            ChargerStatus::Reserved,
            ChargerStatus::Unavailable,
            ChargerStatus::Faulted,
            ChargerStatus::Offline,
        ] {
            assert_eq!(ChargerStatus::parse(s.as_str()), s);
        }
        assert_eq!(ChargerStatus::parse("garbage"), ChargerStatus::Unknown);
    }

    #[test]
    fn default_retry_policy_is_valid() {
        assert!(RetryPolicy::default().validate().is_ok());
    }

    #[test]
    fn retry_policy_bounds() {
        let mut p = RetryPolicy::default();
        p.max_retries = 0;
        assert!(p.validate().is_err());
        p.max_retries = 11;
        assert!(p.validate().is_err());
        p.max_retries = 10;
        p.retry_interval_s = 61;
        assert!(p.validate().is_err());
        p.retry_interval_s = 60;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn unknown_charger_is_connected() {
        let cp = Charger::unknown("CP001");
        assert!(cp.is_connected);
        assert_eq!(cp.status, ChargerStatus::Unknown);
        assert!(cp.last_heartbeat.is_some());
    }

    #[test]
    fn apply_boot_sets_descriptive_fields() {
        let mut cp = Charger::unknown("CP001");
        cp.apply_boot(
            Some("Vendor".into()),
            Some("Model".into()),
            Some("SN1".into()),
            Some("1.0".into()),
        );
        assert_eq!(cp.vendor.as_deref(), Some("Vendor"));
        assert_eq!(cp.firmware_version.as_deref(), Some("1.0"));
    }
}
