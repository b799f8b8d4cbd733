//! Outbound-command retry engine
//!
//! Every CS→CP CALL is tracked as a `PendingOutbound` keyed by message id.
//! A single bookkeeping loop (one per engine, not per message) resends due
//! messages, expires timed-out ones and enforces the per-charger policy.
//!
//! Pending lifecycle:
//!   NEW ─send─▶ response received        ▶ DONE (success / call_error)
//!             ├ retries exhausted        ▶ DONE (exhausted)
//!             ├ response timeout         ▶ DONE (timeout)
//!             └ charger disconnected     ▶ DONE (disconnected),
//!               unless the action queues while disconnected

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::events::{Event, RemoteCommandResultEvent, SharedEventBus};
use crate::application::registry::SharedConnectionRegistry;
use crate::domain::charger::RetryPolicy;
use crate::domain::message_log::{LogDirection, LogStatus, MessageLog};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::system_config::keys;
use crate::support::errors::{DomainError, DomainResult};
use crate::support::ocpp_frame::OcppFrame;
use crate::support::shutdown::ShutdownSignal;

/// Default seconds to wait for a CALLRESULT, measured from first send.
pub const DEFAULT_RESPONSE_TIMEOUT_S: u32 = 30;

/// Actions that stay pending while their charger is offline and are sent on
/// reconnect. Everything else resolves `disconnected` when the CP drops.
const QUEUE_WHILE_DISCONNECTED: &[&str] = &["ChangeConfiguration"];

pub fn queues_while_disconnected(action: &str) -> bool {
    QUEUE_WHILE_DISCONNECTED.contains(&action)
}

/// In-memory record of one outbound CALL awaiting its response.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOutbound {
    pub message_id: String,
    pub charger_id: String,
    pub action: String,
    pub payload: Value,
    pub first_sent_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub retry_interval_s: u32,
    pub retry_enabled: bool,
    pub response_timeout_s: u32,
    pub queue_while_disconnected: bool,
}

impl PendingOutbound {
    /// Hard deadline: the pending is resolved no later than this, whatever
    /// the schedule did.
    fn deadline(&self) -> DateTime<Utc> {
        let window = std::cmp::max(
            self.response_timeout_s as i64,
            (self.max_retries * self.retry_interval_s) as i64,
        );
        self.first_sent_at + chrono::Duration::seconds(window)
    }

    fn due_for_retry(&self, now: DateTime<Utc>) -> bool {
        match self.last_attempt_at {
            Some(last) => {
                now.signed_duration_since(last).num_seconds() >= self.retry_interval_s as i64
            }
            None => true,
        }
    }
}

/// Engine counters for the admin stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RetryEngineStats {
    pub pending_messages: usize,
    pub messages_sent: u64,
    pub messages_failed: u64,
}

pub struct RetryEngine {
    registry: SharedConnectionRegistry,
    repos: Arc<dyn RepositoryProvider>,
    event_bus: SharedEventBus,
    pending: DashMap<String, PendingOutbound>,
    messages_sent: AtomicU64,
    messages_failed: AtomicU64,
}

impl RetryEngine {
    pub fn new(
        registry: SharedConnectionRegistry,
        repos: Arc<dyn RepositoryProvider>,
        event_bus: SharedEventBus,
    ) -> Self {
        Self {
            registry,
            repos,
            event_bus,
            pending: DashMap::new(),
            messages_sent: AtomicU64::new(0),
            messages_failed: AtomicU64::new(0),
        }
    }

    /// Per-charger retry policy, falling back to system configuration.
    async fn policy_for(&self, charger_id: &str) -> RetryPolicy {
        if let Ok(Some(charger)) = self.repos.chargers().find_by_id(charger_id).await {
            return charger.retry_policy;
        }

        let mut policy = RetryPolicy::default();
        if let Ok(Some(entry)) = self.repos.system_config().get(keys::MAX_RETRIES).await {
            if let Some(v) = entry.value_as_u32() {
                policy.max_retries = v.clamp(1, 10);
            }
        }
        if let Ok(Some(entry)) = self.repos.system_config().get(keys::RETRY_INTERVAL).await {
            if let Some(v) = entry.value_as_u32() {
                policy.retry_interval_s = v.clamp(1, 60);
            }
        }
        policy
    }

    /// Dispatch an outbound CALL. Creates the pending record, attempts the
    /// first send if the charger is connected, and returns the message id.
    ///
    /// A disconnected charger is an error unless the action queues while
    /// disconnected, in which case the pending is created without an attempt
    /// and will be sent on reconnect.
    pub async fn send_command(
        &self,
        charger_id: &str,
        action: &str,
        payload: Value,
    ) -> DomainResult<String> {
        let policy = self.policy_for(charger_id).await;
        let message_id = Uuid::new_v4().to_string();
        let connected = self.registry.is_connected(charger_id);
        let queueable = queues_while_disconnected(action) && policy.enabled;

        if !connected && !queueable {
            self.messages_failed.fetch_add(1, Ordering::Relaxed);
            return Err(DomainError::ChargerOffline(charger_id.to_string()));
        }

        let mut pending = PendingOutbound {
            message_id: message_id.clone(),
            charger_id: charger_id.to_string(),
            action: action.to_string(),
            payload: payload.clone(),
            first_sent_at: Utc::now(),
            last_attempt_at: None,
            retry_count: 0,
            max_retries: policy.max_retries,
            retry_interval_s: policy.retry_interval_s,
            retry_enabled: policy.enabled,
            response_timeout_s: DEFAULT_RESPONSE_TIMEOUT_S,
            queue_while_disconnected: queues_while_disconnected(action),
        };

        if connected {
            let frame = OcppFrame::call(&message_id, action, payload.clone());
            if self.registry.send_to_cp(charger_id, &frame).await {
                pending.last_attempt_at = Some(Utc::now());
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
            } else if !queueable {
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
                return Err(DomainError::ChargerOffline(charger_id.to_string()));
            }
        } else {
            info!(
                charger_id,
                action,
                message_id = message_id.as_str(),
                "Charger offline, command queued for retry"
            );
        }

        self.repos
            .message_logs()
            .append(
                MessageLog::new(
                    charger_id,
                    LogDirection::Out,
                    action,
                    Some(message_id.clone()),
                    LogStatus::Pending,
                )
                .with_request(OcppFrame::call(&message_id, action, payload).serialize()),
            )
            .await;

        self.pending.insert(message_id.clone(), pending);
        metrics::gauge!("ocpp_pending_messages").set(self.pending.len() as f64);
        Ok(message_id)
    }

    // ── Response correlation ───────────────────────────────

    /// A CALLRESULT arrived. The first response wins; late or unknown
    /// message ids are ignored.
    pub async fn handle_response(&self, charger_id: &str, message_id: &str, payload: Value) {
        let Some((_, pending)) = self.pending.remove(message_id) else {
            debug!(charger_id, message_id, "Response for unknown or late message");
            return;
        };
        metrics::gauge!("ocpp_pending_messages").set(self.pending.len() as f64);
        info!(
            charger_id,
            action = pending.action.as_str(),
            message_id,
            "Command answered"
        );
        self.resolve(pending, "success", Some(payload), LogStatus::Success)
            .await;
    }

    /// A CALLERROR arrived for one of our CALLs.
    pub async fn handle_error(
        &self,
        charger_id: &str,
        message_id: &str,
        error_code: &str,
        error_description: &str,
    ) {
        let Some((_, pending)) = self.pending.remove(message_id) else {
            debug!(charger_id, message_id, "Error for unknown or late message");
            return;
        };
        metrics::gauge!("ocpp_pending_messages").set(self.pending.len() as f64);
        warn!(
            charger_id,
            action = pending.action.as_str(),
            message_id,
            error_code,
            error_description,
            "Command rejected by charge point"
        );
        let detail = serde_json::json!({
            "errorCode": error_code,
            "errorDescription": error_description,
        });
        self.resolve(pending, "call_error", Some(detail), LogStatus::Error)
            .await;
    }

    /// The charger's socket is gone: resolve its pendings, keeping those in
    /// queued-for-retry mode.
    pub async fn on_charger_disconnected(&self, charger_id: &str) {
        let doomed: Vec<PendingOutbound> = self
            .pending
            .iter()
            .filter(|e| {
                e.charger_id == charger_id && !(e.queue_while_disconnected && e.retry_enabled)
            })
            .map(|e| e.value().clone())
            .collect();

        for pending in doomed {
            self.pending.remove(&pending.message_id);
            self.messages_failed.fetch_add(1, Ordering::Relaxed);
            self.resolve(pending, "disconnected", None, LogStatus::Error)
                .await;
        }
        metrics::gauge!("ocpp_pending_messages").set(self.pending.len() as f64);
    }

    // ── Bookkeeping loop ───────────────────────────────────

    /// Spawn the bookkeeping loop (1 s tick).
    pub fn start(self: &Arc<Self>, shutdown: ShutdownSignal) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            info!("Retry engine started");
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        engine.tick(Utc::now()).await;
                    }
                    _ = shutdown.notified().wait() => {
                        info!("Retry engine shutting down");
                        break;
                    }
                }
            }
        });
    }

    /// One pass over the pending set.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let snapshot: Vec<PendingOutbound> =
            self.pending.iter().map(|e| e.value().clone()).collect();

        for pending in snapshot {
            // First response wins; a resolved entry may already be gone.
            if !self.pending.contains_key(&pending.message_id) {
                continue;
            }

            if now > pending.deadline() {
                self.pending.remove(&pending.message_id);
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    charger_id = pending.charger_id.as_str(),
                    action = pending.action.as_str(),
                    message_id = pending.message_id.as_str(),
                    "Command timed out"
                );
                self.resolve(pending, "timeout", None, LogStatus::Timeout)
                    .await;
                continue;
            }

            if pending.retry_count >= pending.max_retries {
                self.pending.remove(&pending.message_id);
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    charger_id = pending.charger_id.as_str(),
                    action = pending.action.as_str(),
                    message_id = pending.message_id.as_str(),
                    max_retries = pending.max_retries,
                    "Command retries exhausted"
                );
                self.resolve(pending, "exhausted", None, LogStatus::Timeout)
                    .await;
                continue;
            }

            if !pending.due_for_retry(now) {
                continue;
            }

            if !self.registry.is_connected(&pending.charger_id) {
                if pending.queue_while_disconnected && pending.retry_enabled {
                    // Held for reconnect; the deadline still bounds it.
                    continue;
                }
                self.pending.remove(&pending.message_id);
                self.messages_failed.fetch_add(1, Ordering::Relaxed);
                self.resolve(pending, "disconnected", None, LogStatus::Error)
                    .await;
                continue;
            }

            if !pending.retry_enabled && pending.last_attempt_at.is_some() {
                continue;
            }

            let frame = OcppFrame::call(
                &pending.message_id,
                &pending.action,
                pending.payload.clone(),
            );
            let sent = self.registry.send_to_cp(&pending.charger_id, &frame).await;
            if let Some(mut entry) = self.pending.get_mut(&pending.message_id) {
                entry.last_attempt_at = Some(now);
                // The first delivery of a queued message is not a retry.
                if pending.last_attempt_at.is_some() {
                    entry.retry_count += 1;
                    debug!(
                        charger_id = pending.charger_id.as_str(),
                        message_id = pending.message_id.as_str(),
                        retry = entry.retry_count,
                        max_retries = entry.max_retries,
                        sent,
                        "Command retry attempt"
                    );
                }
            }
            if sent {
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
            }
        }
        metrics::gauge!("ocpp_pending_messages").set(self.pending.len() as f64);
    }

    async fn resolve(
        &self,
        pending: PendingOutbound,
        status: &str,
        response: Option<Value>,
        log_status: LogStatus,
    ) {
        self.repos
            .message_logs()
            .append(
                MessageLog::new(
                    &pending.charger_id,
                    LogDirection::Out,
                    &pending.action,
                    Some(pending.message_id.clone()),
                    log_status,
                )
                .with_response(
                    response
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| format!("{{\"result\":\"{status}\"}}")),
                ),
            )
            .await;

        self.event_bus
            .publish(Event::RemoteCommandResult(RemoteCommandResultEvent {
                charger_id: pending.charger_id,
                command: pending.action,
                message_id: pending.message_id,
                status: status.to_string(),
                response,
            }));
    }

    // ── Introspection ──────────────────────────────────────

    pub fn pending_for(&self, charger_id: &str) -> Vec<PendingOutbound> {
        self.pending
            .iter()
            .filter(|e| e.charger_id == charger_id)
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn pending_all(&self) -> Vec<PendingOutbound> {
        self.pending.iter().map(|e| e.value().clone()).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> RetryEngineStats {
        RetryEngineStats {
            pending_messages: self.pending.len(),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
        }
    }
}

pub type SharedRetryEngine = Arc<RetryEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::registry::ConnectionRegistry;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    struct Fixture {
        engine: Arc<RetryEngine>,
        registry: SharedConnectionRegistry,
    }

    fn fixture() -> Fixture {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
        let engine = Arc::new(RetryEngine::new(
            registry.clone(),
            repos,
            create_event_bus(),
        ));
        Fixture { engine, registry }
    }

    fn connect(registry: &ConnectionRegistry, id: &str) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.accept_cp(id, tx).unwrap();
        rx
    }

    #[tokio::test]
    async fn send_to_connected_charger_creates_pending() {
        let f = fixture();
        let mut rx = connect(&f.registry, "CP001");

        let message_id = f
            .engine
            .send_command("CP001", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap();

        assert_eq!(f.engine.pending_count(), 1);
        let Message::Text(text) = rx.recv().await.unwrap() else {
            panic!("expected text");
        };
        assert!(text.contains(&message_id));
    }

    #[tokio::test]
    async fn send_to_offline_charger_is_rejected_unless_queueable() {
        let f = fixture();

        let err = f
            .engine
            .send_command("CP700", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ChargerOffline(_)));

        // ChangeConfiguration queues for retry instead.
        let message_id = f
            .engine
            .send_command(
                "CP700",
                "ChangeConfiguration",
                json!({"key": "HeartbeatInterval", "value": "300"}),
            )
            .await
            .unwrap();
        assert!(!message_id.is_empty());
        assert_eq!(f.engine.pending_count(), 1);
    }

    #[tokio::test]
    async fn first_response_resolves_pending_and_late_ones_are_ignored() {
        let f = fixture();
        let _rx = connect(&f.registry, "CP001");

        let message_id = f
            .engine
            .send_command("CP001", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap();

        f.engine
            .handle_response("CP001", &message_id, json!({"status": "Accepted"}))
            .await;
        assert_eq!(f.engine.pending_count(), 0);

        // Late duplicate is a no-op.
        f.engine
            .handle_response("CP001", &message_id, json!({"status": "Accepted"}))
            .await;
        assert_eq!(f.engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn queued_message_is_sent_on_reconnect() {
        let f = fixture();

        let message_id = f
            .engine
            .send_command(
                "CP700",
                "ChangeConfiguration",
                json!({"key": "HeartbeatInterval", "value": "300"}),
            )
            .await
            .unwrap();

        // Ticks while disconnected fire no send and keep the pending.
        f.engine.tick(Utc::now()).await;
        assert_eq!(f.engine.pending_count(), 1);

        let mut rx = connect(&f.registry, "CP700");
        f.engine.tick(Utc::now()).await;
        let Message::Text(text) = rx.recv().await.unwrap() else {
            panic!("expected text");
        };
        assert!(text.contains(&message_id));
        assert!(text.contains("ChangeConfiguration"));
    }

    #[tokio::test]
    async fn pending_expires_after_deadline() {
        let f = fixture();
        let _rx = connect(&f.registry, "CP001");

        f.engine
            .send_command("CP001", "Reset", json!({"type": "Hard"}))
            .await
            .unwrap();
        assert_eq!(f.engine.pending_count(), 1);

        // Default policy: max(30, 3*5) = 30 s window.
        let later = Utc::now() + chrono::Duration::seconds(31);
        f.engine.tick(later).await;
        assert_eq!(f.engine.pending_count(), 0);
        assert_eq!(f.engine.stats().messages_failed, 1);
    }

    #[tokio::test]
    async fn disconnect_resolves_non_queueable_pendings() {
        let f = fixture();
        let _rx = connect(&f.registry, "CP001");

        f.engine
            .send_command("CP001", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap();
        f.engine
            .send_command(
                "CP001",
                "ChangeConfiguration",
                json!({"key": "K", "value": "V"}),
            )
            .await
            .unwrap();

        f.registry.deregister_cp("CP001");
        f.engine.on_charger_disconnected("CP001").await;

        let remaining = f.engine.pending_all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "ChangeConfiguration");
    }

    #[tokio::test]
    async fn retries_respect_interval_and_exhaust() {
        let f = fixture();
        let mut rx = connect(&f.registry, "CP001");

        let t0 = Utc::now();
        f.engine
            .send_command("CP001", "Reset", json!({"type": "Soft"}))
            .await
            .unwrap();
        let _ = rx.recv().await; // initial send

        // Not yet due.
        f.engine.tick(t0 + chrono::Duration::seconds(1)).await;
        assert!(rx.try_recv().is_err());

        // Due after the interval (default 5 s).
        f.engine.tick(t0 + chrono::Duration::seconds(6)).await;
        assert!(rx.try_recv().is_ok());

        let pending = &f.engine.pending_all()[0];
        assert_eq!(pending.retry_count, 1);
    }
}
