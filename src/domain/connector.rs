//! Connector domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical connector on a charger. Connector 0 denotes the whole station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    /// Surrogate key (database id).
    pub id: i32,
    pub charger_id: String,
    /// OCPP connector id (>= 0; 0 = whole station).
    pub connector_id: i32,

    pub status: String,
    pub error_code: Option<String>,

    /// Cumulative energy reported on this connector, kWh.
    pub energy_delivered_kwh: f64,
    /// Last reported charging power, kW.
    pub power_delivered_kw: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connector {
    pub fn new(charger_id: impl Into<String>, connector_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            charger_id: charger_id.into(),
            connector_id,
            status: "Available".to_string(),
            error_code: None,
            energy_delivered_kwh: 0.0,
            power_delivered_kw: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_status(&mut self, status: impl Into<String>, error_code: Option<String>) {
        self.status = status.into();
        self.error_code = error_code;
        self.updated_at = Utc::now();
    }

    /// Record an Energy.Active.Import.Register sample (Wh on the wire).
    pub fn record_energy_wh(&mut self, value_wh: f64) {
        self.energy_delivered_kwh = value_wh / 1000.0;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_sample_converts_to_kwh() {
        let mut c = Connector::new("CP001", 1);
        c.record_energy_wh(2500.0);
        assert!((c.energy_delivered_kwh - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn status_update_keeps_error_code() {
        let mut c = Connector::new("CP001", 1);
        c.apply_status("Faulted", Some("GroundFailure".into()));
        assert_eq!(c.status, "Faulted");
        assert_eq!(c.error_code.as_deref(), Some("GroundFailure"));
    }
}
