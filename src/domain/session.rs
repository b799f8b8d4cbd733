//! Charging session (transaction) domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default energy rate, currency units per kWh. Overridable via
/// `SESSION_RATE_PER_KWH`.
pub const DEFAULT_RATE_PER_KWH: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Completed,
    Stopped,
    Faulted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Stopped => "Stopped",
            Self::Faulted => "Faulted",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Active" => Self::Active,
            "Completed" => Self::Completed,
            "Stopped" => Self::Stopped,
            _ => Self::Faulted,
        }
    }
}

/// One charging session, keyed by a surrogate id with a per-charger OCPP
/// `transaction_id` once StartTransaction has been accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingSession {
    /// Surrogate key (database id; 0 until persisted).
    pub id: i32,
    /// OCPP transaction id, monotone per charger, >= 1.
    pub transaction_id: Option<i32>,
    pub charger_id: String,
    pub connector_id: Option<i32>,

    pub id_tag: Option<String>,
    pub user_id: Option<String>,

    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    /// Seconds between start and stop.
    pub duration_s: Option<i64>,

    pub energy_delivered_kwh: f64,
    pub cost: f64,

    pub status: SessionStatus,

    /// Meter readings in Wh.
    pub meter_start: Option<f64>,
    pub meter_stop: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChargingSession {
    pub fn start(
        charger_id: impl Into<String>,
        connector_id: i32,
        transaction_id: i32,
        id_tag: Option<String>,
        meter_start: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            transaction_id: Some(transaction_id),
            charger_id: charger_id.into(),
            connector_id: Some(connector_id),
            id_tag,
            user_id: None,
            start_time: now,
            stop_time: None,
            duration_s: None,
            energy_delivered_kwh: 0.0,
            cost: 0.0,
            status: SessionStatus::Active,
            meter_start: Some(meter_start),
            meter_stop: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Close the session: records stop time and meter, derives energy
    /// (`(meter_stop - meter_start) / 1000` kWh) and cost at `rate` per kWh.
    pub fn stop(&mut self, meter_stop: f64, rate_per_kwh: f64) {
        let now = Utc::now();
        self.stop_time = Some(now);
        self.duration_s = Some(now.signed_duration_since(self.start_time).num_seconds());
        self.meter_stop = Some(meter_stop);
        self.energy_delivered_kwh = match self.meter_start {
            Some(start) => (meter_stop - start) / 1000.0,
            None => 0.0,
        };
        self.cost = self.energy_delivered_kwh * rate_per_kwh;
        self.status = SessionStatus::Completed;
        self.updated_at = now;
    }

    /// Mark a lingering session Faulted (used when a new StartTransaction
    /// arrives while one is still Active).
    pub fn fault(&mut self) {
        self.status = SessionStatus::Faulted;
        self.stop_time = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChargingSession {
        ChargingSession::start("CP001", 1, 1, Some("TAG-1".into()), 1000.0)
    }

    #[test]
    fn start_is_active() {
        let s = sample();
        assert!(s.is_active());
        assert_eq!(s.transaction_id, Some(1));
        assert_eq!(s.meter_start, Some(1000.0));
        assert!(s.stop_time.is_none());
    }

    #[test]
    fn stop_computes_energy_and_cost() {
        let mut s = sample();
        s.stop(2500.0, DEFAULT_RATE_PER_KWH);
        assert_eq!(s.status, SessionStatus::Completed);
        assert!((s.energy_delivered_kwh - 1.5).abs() < 1e-9);
        assert!((s.cost - 0.225).abs() < 1e-9);
        assert!(s.stop_time.is_some());
        assert!(s.duration_s.is_some());
    }

    #[test]
    fn stop_without_meter_start_yields_zero_energy() {
        let mut s = sample();
        s.meter_start = None;
        s.stop(2500.0, DEFAULT_RATE_PER_KWH);
        assert_eq!(s.energy_delivered_kwh, 0.0);
        assert_eq!(s.cost, 0.0);
    }

    #[test]
    fn fault_closes_session() {
        let mut s = sample();
        s.fault();
        assert_eq!(s.status, SessionStatus::Faulted);
        assert!(!s.is_active());
    }

    #[test]
    fn status_roundtrip() {
        for st in [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Stopped,
            SessionStatus::Faulted,
        ] {
            assert_eq!(SessionStatus::parse(st.as_str()), st);
        }
    }
}
