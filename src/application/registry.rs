//! Connection registry
//!
//! Single owner of all live socket handles: charge-point writers, master
//! observer sockets and dashboard sockets. Every other component addresses a
//! charger by id and asks the registry to send.
//!
//! Writes to one CP socket are serialized through its single writer task;
//! the registry only ever enqueues onto that task's channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::message_log::{LogDirection, LogStatus, MessageLog};
use crate::domain::repositories::RepositoryProvider;
use crate::support::ocpp_frame::OcppFrame;

/// Direction of a frame relative to the central system, as reported in the
/// observer envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardDirection {
    Incoming,
    Outgoing,
}

impl ForwardDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// One registered charge-point socket.
struct CpConnection {
    sender: mpsc::UnboundedSender<Message>,
    connection_id: String,
    connected_at: DateTime<Utc>,
}

/// One registered dashboard socket, tagged with its authenticated principal.
struct DashboardConnection {
    sender: mpsc::UnboundedSender<Message>,
    #[allow(dead_code)]
    principal: String,
}

/// Registry counters, snapshotted for the admin stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub connections_total: u64,
    pub connections_active: usize,
    pub master_connections: usize,
    pub dashboard_connections: usize,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_failed: u64,
    pub messages_forwarded: u64,
}

pub struct ConnectionRegistry {
    chargers: DashMap<String, CpConnection>,
    masters: DashMap<u64, mpsc::UnboundedSender<Message>>,
    dashboards: DashMap<u64, DashboardConnection>,
    observer_seq: AtomicU64,
    repos: Arc<dyn RepositoryProvider>,

    connections_total: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_failed: AtomicU64,
    messages_forwarded: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            chargers: DashMap::new(),
            masters: DashMap::new(),
            dashboards: DashMap::new(),
            observer_seq: AtomicU64::new(1),
            repos,
            connections_total: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            messages_failed: AtomicU64::new(0),
            messages_forwarded: AtomicU64::new(0),
        }
    }

    // ── Charge points ──────────────────────────────────────

    /// Register a CP socket writer. Rejects a second socket for the same
    /// charger id; the caller must close it with 1003.
    pub fn accept_cp(
        &self,
        charger_id: &str,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Result<String, String> {
        use dashmap::mapref::entry::Entry;

        match self.chargers.entry(charger_id.to_string()) {
            Entry::Occupied(_) => Err(format!("Charger ID already connected: {charger_id}")),
            Entry::Vacant(slot) => {
                let connection_id = Uuid::new_v4().to_string();
                slot.insert(CpConnection {
                    sender,
                    connection_id: connection_id.clone(),
                    connected_at: Utc::now(),
                });
                self.connections_total.fetch_add(1, Ordering::Relaxed);
                metrics::gauge!("ocpp_connections_active").set(self.chargers.len() as f64);
                info!(charger_id, connection_id, "Charge point registered");
                Ok(connection_id)
            }
        }
    }

    /// Remove a CP socket. Returns `(connection_id, session_duration_s)` if
    /// the charger was registered.
    pub fn deregister_cp(&self, charger_id: &str) -> Option<(String, i64)> {
        let (_, conn) = self.chargers.remove(charger_id)?;
        let duration = Utc::now()
            .signed_duration_since(conn.connected_at)
            .num_seconds();
        metrics::gauge!("ocpp_connections_active").set(self.chargers.len() as f64);
        info!(charger_id, duration_s = duration, "Charge point deregistered");
        Some((conn.connection_id, duration))
    }

    pub fn is_connected(&self, charger_id: &str) -> bool {
        self.chargers.contains_key(charger_id)
    }

    pub fn connected_ids(&self) -> Vec<String> {
        self.chargers.iter().map(|e| e.key().clone()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.chargers.len()
    }

    pub fn connection_id_for(&self, charger_id: &str) -> Option<String> {
        self.chargers
            .get(charger_id)
            .map(|e| e.connection_id.clone())
    }

    pub fn connected_since(&self, charger_id: &str) -> Option<DateTime<Utc>> {
        self.chargers.get(charger_id).map(|e| e.connected_at)
    }

    /// Charger ids whose writer task has gone away (socket closed or write
    /// broken). The liveness monitor sweeps these.
    pub fn dead_charger_ids(&self) -> Vec<String> {
        self.chargers
            .iter()
            .filter(|e| e.sender.is_closed())
            .map(|e| e.key().clone())
            .collect()
    }

    /// Serialize and enqueue a frame onto the charger's writer. Forwards an
    /// `outgoing` envelope to masters on success.
    pub async fn send_to_cp(&self, charger_id: &str, frame: &OcppFrame) -> bool {
        let (sender, connection_id) = match self.chargers.get(charger_id) {
            Some(conn) => (conn.sender.clone(), conn.connection_id.clone()),
            None => {
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        let text = frame.serialize();
        if sender.send(Message::Text(text)).is_err() {
            self.messages_failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ocpp_messages_failed_total").increment(1);
            warn!(charger_id, "Send failed: writer task gone");
            return false;
        }

        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ocpp_messages_sent_total").increment(1);
        self.forward_to_masters(
            charger_id,
            &connection_id,
            &frame.to_value(),
            ForwardDirection::Outgoing,
            0.0,
        )
        .await;
        true
    }

    /// Best-effort broadcast of a raw text frame to every connected CP.
    /// Returns `(sent, failed)` counts.
    pub async fn broadcast_to_cps(&self, text: &str) -> (usize, usize) {
        let targets: Vec<(String, mpsc::UnboundedSender<Message>, String)> = self
            .chargers
            .iter()
            .map(|e| {
                (
                    e.key().clone(),
                    e.sender.clone(),
                    e.connection_id.clone(),
                )
            })
            .collect();

        let message: Value =
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));

        let mut sent = 0;
        let mut failed = 0;
        for (charger_id, sender, connection_id) in targets {
            if sender.send(Message::Text(text.to_string())).is_ok() {
                sent += 1;
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                self.forward_to_masters(
                    &charger_id,
                    &connection_id,
                    &message,
                    ForwardDirection::Outgoing,
                    0.0,
                )
                .await;
            } else {
                failed += 1;
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        (sent, failed)
    }

    /// Enqueue a WebSocket ping on the charger's writer (keepalive).
    pub fn send_ping(&self, charger_id: &str) -> bool {
        match self.chargers.get(charger_id) {
            Some(conn) => conn.sender.send(Message::Ping(Vec::new())).is_ok(),
            None => false,
        }
    }

    /// Enqueue a close frame on the charger's writer.
    pub fn send_close(
        &self,
        charger_id: &str,
        code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode,
        reason: &'static str,
    ) -> bool {
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;
        match self.chargers.get(charger_id) {
            Some(conn) => conn
                .sender
                .send(Message::Close(Some(CloseFrame {
                    code,
                    reason: reason.into(),
                })))
                .is_ok(),
            None => false,
        }
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ocpp_messages_received_total").increment(1);
    }

    // ── Master observers ───────────────────────────────────

    pub fn register_master(&self, sender: mpsc::UnboundedSender<Message>) -> u64 {
        let id = self.observer_seq.fetch_add(1, Ordering::Relaxed);
        self.masters.insert(id, sender);
        info!(master_id = id, total = self.masters.len(), "Master observer attached");
        id
    }

    pub fn deregister_master(&self, id: u64) {
        if self.masters.remove(&id).is_some() {
            info!(master_id = id, total = self.masters.len(), "Master observer detached");
        }
    }

    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    /// Wrap a frame in the observer envelope and write it to every attached
    /// master socket. Sockets whose writer is gone are dropped. The envelope
    /// is also appended to the message log with direction FORWARD.
    pub async fn forward_to_masters(
        &self,
        charger_id: &str,
        connection_id: &str,
        ocpp_message: &Value,
        direction: ForwardDirection,
        processing_time_ms: f64,
    ) {
        if self.masters.is_empty() {
            return;
        }

        let envelope = json!({
            "message_type": "ocpp_forward",
            "timestamp": Utc::now(),
            "charger_id": charger_id,
            "connection_id": connection_id,
            "direction": direction.as_str(),
            "ocpp_message": ocpp_message,
            "processing_time_ms": processing_time_ms,
            "source": "ocpp_handler",
        });
        let text = envelope.to_string();

        let message_id = ocpp_message
            .get(1)
            .and_then(|v| v.as_str())
            .map(String::from);
        self.repos
            .message_logs()
            .append(
                MessageLog::new(
                    charger_id,
                    LogDirection::Forward,
                    "ForwardToMaster",
                    message_id,
                    LogStatus::Success,
                )
                .with_request(text.clone()),
            )
            .await;

        let mut dead = Vec::new();
        for entry in self.masters.iter() {
            if entry.value().send(Message::Text(text.clone())).is_err() {
                dead.push(*entry.key());
            } else {
                self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("ocpp_messages_forwarded_total").increment(1);
            }
        }
        for id in dead {
            debug!(master_id = id, "Dropping dead master socket");
            self.masters.remove(&id);
        }
    }

    // ── Dashboards ─────────────────────────────────────────

    pub fn register_dashboard(
        &self,
        sender: mpsc::UnboundedSender<Message>,
        principal: impl Into<String>,
    ) -> u64 {
        let id = self.observer_seq.fetch_add(1, Ordering::Relaxed);
        self.dashboards.insert(
            id,
            DashboardConnection {
                sender,
                principal: principal.into(),
            },
        );
        info!(dashboard_id = id, total = self.dashboards.len(), "Dashboard attached");
        id
    }

    pub fn deregister_dashboard(&self, id: u64) {
        if self.dashboards.remove(&id).is_some() {
            info!(dashboard_id = id, total = self.dashboards.len(), "Dashboard detached");
        }
    }

    pub fn dashboard_count(&self) -> usize {
        self.dashboards.len()
    }

    /// Push a text message to every dashboard socket, dropping dead ones.
    pub fn broadcast_to_dashboards(&self, text: &str) {
        let mut dead = Vec::new();
        for entry in self.dashboards.iter() {
            if entry
                .value()
                .sender
                .send(Message::Text(text.to_string()))
                .is_err()
            {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.dashboards.remove(&id);
        }
    }

    // ── Stats ──────────────────────────────────────────────

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.chargers.len(),
            master_connections: self.masters.len(),
            dashboard_connections: self.dashboards.len(),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
        }
    }
}

pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryRepositoryProvider;

    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::new(Arc::new(MemoryRepositoryProvider::new()))
    }

    #[tokio::test]
    async fn second_connect_for_same_charger_is_rejected() {
        let registry = registry();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        assert!(registry.accept_cp("CP001", tx1).is_ok());
        assert!(registry.accept_cp("CP001", tx2).is_err());
        assert_eq!(registry.connection_count(), 1);
    }

    #[tokio::test]
    async fn send_to_unknown_charger_fails() {
        let registry = registry();
        let frame = OcppFrame::call("m1", "Reset", json!({"type": "Soft"}));
        assert!(!registry.send_to_cp("CP404", &frame).await);
        assert_eq!(registry.stats().messages_failed, 1);
    }

    #[tokio::test]
    async fn send_reaches_writer_channel() {
        let registry = registry();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.accept_cp("CP001", tx).unwrap();

        let frame = OcppFrame::call("m1", "Reset", json!({"type": "Soft"}));
        assert!(registry.send_to_cp("CP001", &frame).await);

        let Message::Text(text) = rx.recv().await.unwrap() else {
            panic!("expected text frame");
        };
        assert!(text.contains("\"Reset\""));
    }

    #[tokio::test]
    async fn deregister_reports_duration() {
        let registry = registry();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection_id = registry.accept_cp("CP001", tx).unwrap();

        let (removed_id, duration) = registry.deregister_cp("CP001").unwrap();
        assert_eq!(removed_id, connection_id);
        assert!(duration >= 0);
        assert!(!registry.is_connected("CP001"));
        assert!(registry.deregister_cp("CP001").is_none());
    }

    #[tokio::test]
    async fn masters_receive_one_envelope_per_frame() {
        let registry = registry();
        let (master_tx, mut master_rx) = mpsc::unbounded_channel();
        registry.register_master(master_tx);

        let frame = OcppFrame::call("h1", "Heartbeat", json!({}));
        registry
            .forward_to_masters("CP001", "conn-1", &frame.to_value(), ForwardDirection::Incoming, 1.0)
            .await;

        let Message::Text(text) = master_rx.recv().await.unwrap() else {
            panic!("expected text envelope");
        };
        let envelope: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope["message_type"], "ocpp_forward");
        assert_eq!(envelope["direction"], "incoming");
        assert_eq!(envelope["charger_id"], "CP001");
        assert_eq!(envelope["ocpp_message"][2], "Heartbeat");
        assert_eq!(envelope["source"], "ocpp_handler");

        // exactly one envelope
        assert!(master_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_master_is_dropped_on_forward() {
        let registry = registry();
        let (master_tx, master_rx) = mpsc::unbounded_channel();
        registry.register_master(master_tx);
        drop(master_rx);

        registry
            .forward_to_masters("CP001", "c", &json!([2, "x", "Heartbeat", {}]), ForwardDirection::Incoming, 0.0)
            .await;
        assert_eq!(registry.master_count(), 0);
    }

    #[tokio::test]
    async fn dead_socket_sweep_detects_closed_writer() {
        let registry = registry();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.accept_cp("CP001", tx).unwrap();
        assert!(registry.dead_charger_ids().is_empty());
        drop(rx);
        assert_eq!(registry.dead_charger_ids(), vec!["CP001".to_string()]);
    }
}
