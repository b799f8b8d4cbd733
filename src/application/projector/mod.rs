//! Session projector
//!
//! In-memory live view of active charging sessions and charger status, fed
//! by the event bus and pushed to dashboard observers. A 30 s refresher
//! reconciles the view with persistence; an hourly cleanup evicts sessions
//! older than 24 h.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::application::events::{Event, EventMessage, SharedEventBus};
use crate::application::registry::SharedConnectionRegistry;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::session::DEFAULT_RATE_PER_KWH;
use crate::support::shutdown::ShutdownSignal;

/// Status refresher cadence.
const REFRESH_INTERVAL_S: u64 = 30;
/// Stale-session cleanup cadence.
const CLEANUP_INTERVAL_S: u64 = 3600;
/// Sessions older than this are evicted from the live view.
const SESSION_MAX_AGE_S: i64 = 86_400;

/// Live view of one active charging session.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSession {
    pub session_id: i32,
    pub transaction_id: Option<i32>,
    pub charger_id: String,
    pub connector_id: Option<i32>,
    pub id_tag: Option<String>,
    pub start_time: DateTime<Utc>,
    pub meter_start: Option<f64>,
    pub energy_delivered_kwh: f64,
    pub power_delivered_kw: f64,
    pub voltage: Option<f64>,
    pub current_a: Option<f64>,
    pub status: String,
}

/// Live view of one charger.
#[derive(Debug, Clone, Serialize)]
pub struct LiveCharger {
    pub charger_id: String,
    pub status: String,
    pub is_connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub connectors: Vec<Value>,
    pub active_sessions: usize,
    pub total_energy_today: f64,
    pub total_sessions_today: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectorStats {
    pub total_sessions: u64,
    pub active_sessions: usize,
    pub completed_sessions: u64,
    pub total_energy_delivered: f64,
    pub total_revenue: f64,
}

#[derive(Default)]
struct ProjectorState {
    active_sessions: HashMap<i32, LiveSession>,
    charger_status: HashMap<String, LiveCharger>,
    stats: ProjectorStats,
}

pub struct SessionProjector {
    repos: Arc<dyn RepositoryProvider>,
    registry: SharedConnectionRegistry,
    rate_per_kwh: f64,
    state: Mutex<ProjectorState>,
}

impl SessionProjector {
    pub fn new(repos: Arc<dyn RepositoryProvider>, registry: SharedConnectionRegistry) -> Self {
        Self {
            repos,
            registry,
            rate_per_kwh: DEFAULT_RATE_PER_KWH,
            state: Mutex::new(ProjectorState::default()),
        }
    }

    pub fn with_rate(mut self, rate_per_kwh: f64) -> Self {
        self.rate_per_kwh = rate_per_kwh;
        self
    }

    /// Spawn the projector task: bus consumption, periodic refresh, cleanup.
    pub fn start(self: &Arc<Self>, event_bus: SharedEventBus, shutdown: ShutdownSignal) {
        let projector = Arc::clone(self);
        tokio::spawn(async move {
            info!("Session projector started");
            let mut subscriber = event_bus.subscribe();
            let mut refresh = tokio::time::interval(Duration::from_secs(REFRESH_INTERVAL_S));
            let mut cleanup = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_S));

            loop {
                tokio::select! {
                    message = subscriber.recv() => {
                        match message {
                            Some(message) => projector.apply_event(&message).await,
                            None => break,
                        }
                    }
                    _ = refresh.tick() => {
                        projector.refresh_all().await;
                    }
                    _ = cleanup.tick() => {
                        projector.cleanup_stale_sessions(Utc::now());
                    }
                    _ = shutdown.notified().wait() => {
                        info!("Session projector shutting down");
                        break;
                    }
                }
            }
        });
    }

    // ── Event application ──────────────────────────────────

    pub async fn apply_event(&self, message: &EventMessage) {
        match &message.event {
            Event::TransactionStarted(e) => {
                let session = LiveSession {
                    session_id: e.session_id,
                    transaction_id: Some(e.transaction_id),
                    charger_id: e.charger_id.clone(),
                    connector_id: Some(e.connector_id),
                    id_tag: e.id_tag.clone(),
                    start_time: e.start_time,
                    meter_start: Some(e.meter_start),
                    energy_delivered_kwh: 0.0,
                    power_delivered_kw: 0.0,
                    voltage: None,
                    current_a: None,
                    status: "Active".to_string(),
                };
                let data = {
                    let mut state = self.state.lock().unwrap();
                    state.active_sessions.insert(e.session_id, session.clone());
                    state.stats.total_sessions += 1;
                    state.stats.active_sessions = state.active_sessions.len();
                    serde_json::to_value(&session).unwrap_or(Value::Null)
                };
                self.refresh_charger(&e.charger_id).await;
                self.notify_dashboards("session_started", data);
            }

            Event::TransactionStopped(e) => {
                let removed = {
                    let mut state = self.state.lock().unwrap();
                    let removed = state.active_sessions.remove(&e.session_id);
                    state.stats.active_sessions = state.active_sessions.len();
                    state.stats.completed_sessions += 1;
                    state.stats.total_energy_delivered += e.energy_delivered_kwh;
                    state.stats.total_revenue += e.cost;
                    removed
                };
                let mut data = serde_json::to_value(&removed).unwrap_or(Value::Null);
                if let Value::Object(ref mut map) = data {
                    map.insert("status".into(), json!("Completed"));
                    map.insert("energy_delivered_kwh".into(), json!(e.energy_delivered_kwh));
                    map.insert("cost".into(), json!(e.cost));
                    map.insert("duration_s".into(), json!(e.duration_s));
                    map.insert("stop_time".into(), json!(e.stop_time));
                }
                self.refresh_charger(&e.charger_id).await;
                self.notify_dashboards("session_stopped", data);
            }

            Event::MeterValuesReceived(e) => {
                let updated = {
                    let mut state = self.state.lock().unwrap();
                    let session = state.active_sessions.values_mut().find(|s| {
                        s.charger_id == e.charger_id
                            && (e.transaction_id.is_none() || s.transaction_id == e.transaction_id)
                    });
                    session.map(|session| {
                        if let Some(kwh) = e.energy_kwh {
                            session.energy_delivered_kwh = kwh;
                        }
                        if let Some(kw) = e.power_kw {
                            session.power_delivered_kw = kw;
                        }
                        if e.voltage.is_some() {
                            session.voltage = e.voltage;
                        }
                        if e.current_a.is_some() {
                            session.current_a = e.current_a;
                        }
                        serde_json::to_value(&*session).unwrap_or(Value::Null)
                    })
                };
                if let Some(data) = updated {
                    self.notify_dashboards("meter_update", data);
                }
            }

            Event::StatusNotification(e) => {
                self.refresh_charger(&e.charger_id).await;
                self.notify_dashboards(
                    "status_update",
                    json!({
                        "charger_id": e.charger_id,
                        "connector_id": e.connector_id,
                        "status": e.status,
                        "error_code": e.error_code,
                    }),
                );
            }

            Event::HeartbeatReceived(e) => {
                let mut state = self.state.lock().unwrap();
                if let Some(charger) = state.charger_status.get_mut(&e.charger_id) {
                    charger.last_heartbeat = Some(message.timestamp);
                }
            }

            Event::BootNotification(e) => {
                self.refresh_charger(&e.charger_id).await;
            }

            Event::ChargerConnected(e) => {
                self.refresh_charger(&e.charger_id).await;
            }

            Event::ChargerDisconnected(e) => {
                self.refresh_charger(&e.charger_id).await;
            }

            Event::RemoteCommandResult(_) => {}
        }
    }

    // ── Reconciliation ─────────────────────────────────────

    /// Re-read one charger (row + connectors + daily statistics) from
    /// persistence into the live view.
    pub async fn refresh_charger(&self, charger_id: &str) {
        let Ok(Some(charger)) = self.repos.chargers().find_by_id(charger_id).await else {
            return;
        };

        let connectors = self
            .repos
            .connectors()
            .list_for_charger(charger_id)
            .await
            .unwrap_or_default();
        let connector_data: Vec<Value> = connectors
            .iter()
            .map(|c| {
                json!({
                    "connector_id": c.connector_id,
                    "status": c.status,
                    "error_code": c.error_code,
                    "energy_delivered_kwh": c.energy_delivered_kwh,
                    "power_delivered_kw": c.power_delivered_kw,
                })
            })
            .collect();

        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);
        let today = self
            .repos
            .sessions()
            .started_since(charger_id, midnight)
            .await
            .unwrap_or_default();
        let total_energy_today: f64 = today.iter().map(|s| s.energy_delivered_kwh).sum();

        let mut state = self.state.lock().unwrap();
        let active = state
            .active_sessions
            .values()
            .filter(|s| s.charger_id == charger_id)
            .count();
        state.charger_status.insert(
            charger_id.to_string(),
            LiveCharger {
                charger_id: charger_id.to_string(),
                status: charger.status.as_str().to_string(),
                is_connected: charger.is_connected,
                last_heartbeat: charger.last_heartbeat,
                connectors: connector_data,
                active_sessions: active,
                total_energy_today,
                total_sessions_today: today.len(),
            },
        );
    }

    /// 30 s pass: refresh every known live charger and push a status update
    /// to the dashboards.
    pub async fn refresh_all(&self) {
        let charger_ids: Vec<String> = {
            let state = self.state.lock().unwrap();
            state.charger_status.keys().cloned().collect()
        };
        for charger_id in charger_ids {
            self.refresh_charger(&charger_id).await;
        }

        if self.registry.dashboard_count() > 0 {
            let snapshot = self.snapshot();
            self.notify_dashboards("status_update", snapshot);
        }
    }

    /// Hourly pass: evict live sessions older than 24 h.
    pub fn cleanup_stale_sessions(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let before = state.active_sessions.len();
        state.active_sessions.retain(|_, session| {
            now.signed_duration_since(session.start_time).num_seconds() <= SESSION_MAX_AGE_S
        });
        let evicted = before - state.active_sessions.len();
        if evicted > 0 {
            state.stats.active_sessions = state.active_sessions.len();
            warn!(evicted, "Evicted stale live sessions");
        }
    }

    // ── Dashboard feed ─────────────────────────────────────

    /// The `initial_data` message sent to a dashboard on connect.
    pub fn initial_data(&self) -> Value {
        let state = self.state.lock().unwrap();
        json!({
            "type": "initial_data",
            "timestamp": Utc::now(),
            "active_sessions": state.active_sessions.values().collect::<Vec<_>>(),
            "charger_status": state.charger_status,
            "statistics": state.stats,
        })
    }

    fn notify_dashboards(&self, event_type: &str, data: Value) {
        if self.registry.dashboard_count() == 0 {
            return;
        }
        let message = json!({
            "type": event_type,
            "timestamp": Utc::now(),
            "data": data,
        });
        self.registry.broadcast_to_dashboards(&message.to_string());
    }

    fn snapshot(&self) -> Value {
        let state = self.state.lock().unwrap();
        json!({
            "charger_status": state.charger_status,
            "active_sessions": state.active_sessions.values().collect::<Vec<_>>(),
            "statistics": state.stats,
        })
    }

    // ── Introspection ──────────────────────────────────────

    pub fn active_sessions(&self) -> Vec<LiveSession> {
        self.state
            .lock()
            .unwrap()
            .active_sessions
            .values()
            .cloned()
            .collect()
    }

    pub fn charger_status(&self, charger_id: &str) -> Option<LiveCharger> {
        self.state
            .lock()
            .unwrap()
            .charger_status
            .get(charger_id)
            .cloned()
    }

    pub fn stats(&self) -> ProjectorStats {
        let state = self.state.lock().unwrap();
        ProjectorStats {
            active_sessions: state.active_sessions.len(),
            ..state.stats.clone()
        }
    }

    pub fn rate_per_kwh(&self) -> f64 {
        self.rate_per_kwh
    }
}

pub type SharedSessionProjector = Arc<SessionProjector>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{
        MeterValuesEvent, TransactionStartedEvent, TransactionStoppedEvent,
    };
    use crate::application::registry::ConnectionRegistry;
    use crate::domain::charger::Charger;
    use crate::infrastructure::storage::MemoryRepositoryProvider;

    fn fixture() -> (Arc<MemoryRepositoryProvider>, SessionProjector) {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
        let projector = SessionProjector::new(repos.clone(), registry);
        (repos, projector)
    }

    fn started(session_id: i32, transaction_id: i32) -> EventMessage {
        EventMessage::new(Event::TransactionStarted(TransactionStartedEvent {
            charger_id: "CP001".into(),
            session_id,
            transaction_id,
            connector_id: 1,
            id_tag: Some("T".into()),
            meter_start: 1000.0,
            start_time: Utc::now(),
        }))
    }

    #[tokio::test]
    async fn start_then_stop_tracks_stats() {
        let (repos, projector) = fixture();
        repos.chargers().insert(Charger::unknown("CP001")).await.unwrap();

        projector.apply_event(&started(1, 1)).await;
        assert_eq!(projector.active_sessions().len(), 1);
        assert_eq!(projector.stats().total_sessions, 1);

        projector
            .apply_event(&EventMessage::new(Event::TransactionStopped(
                TransactionStoppedEvent {
                    charger_id: "CP001".into(),
                    session_id: 1,
                    transaction_id: 1,
                    connector_id: Some(1),
                    id_tag: Some("T".into()),
                    meter_stop: 2500.0,
                    energy_delivered_kwh: 1.5,
                    cost: 0.225,
                    duration_s: Some(60),
                    stop_time: Some(Utc::now()),
                },
            )))
            .await;

        assert!(projector.active_sessions().is_empty());
        let stats = projector.stats();
        assert_eq!(stats.completed_sessions, 1);
        assert!((stats.total_energy_delivered - 1.5).abs() < 1e-9);
        assert!((stats.total_revenue - 0.225).abs() < 1e-9);
    }

    #[tokio::test]
    async fn meter_update_patches_live_session() {
        let (_repos, projector) = fixture();
        projector.apply_event(&started(1, 1)).await;

        projector
            .apply_event(&EventMessage::new(Event::MeterValuesReceived(
                MeterValuesEvent {
                    charger_id: "CP001".into(),
                    connector_id: 1,
                    transaction_id: Some(1),
                    energy_kwh: Some(0.8),
                    power_kw: Some(7.2),
                    voltage: Some(230.0),
                    current_a: Some(31.0),
                },
            )))
            .await;

        let sessions = projector.active_sessions();
        assert!((sessions[0].energy_delivered_kwh - 0.8).abs() < 1e-9);
        assert!((sessions[0].power_delivered_kw - 7.2).abs() < 1e-9);
        assert_eq!(sessions[0].voltage, Some(230.0));
    }

    #[tokio::test]
    async fn cleanup_evicts_only_old_sessions() {
        let (_repos, projector) = fixture();
        projector.apply_event(&started(1, 1)).await;
        projector.apply_event(&started(2, 2)).await;

        // Session 1 started 25 h ago.
        {
            let mut state = projector.state.lock().unwrap();
            state.active_sessions.get_mut(&1).unwrap().start_time =
                Utc::now() - chrono::Duration::hours(25);
        }

        projector.cleanup_stale_sessions(Utc::now());
        let remaining = projector.active_sessions();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].session_id, 2);
    }

    #[tokio::test]
    async fn initial_data_shape() {
        let (repos, projector) = fixture();
        repos.chargers().insert(Charger::unknown("CP001")).await.unwrap();
        projector.apply_event(&started(1, 1)).await;

        let data = projector.initial_data();
        assert_eq!(data["type"], "initial_data");
        assert!(data["timestamp"].is_string());
        assert_eq!(data["active_sessions"].as_array().unwrap().len(), 1);
        assert!(data["charger_status"]["CP001"].is_object());
        assert!(data["statistics"]["total_sessions"].is_number());
    }
}
