//! Back-office event bridge
//!
//! Delivers domain events to the external HTTP sink, falling back to a
//! durable Redis list when the sink is unreachable. Also listens for
//! inbound commands from the back-office queue and answers them through the
//! same outbound path the admin facade uses.

mod commands;

pub use commands::{CommandRequest, CommandResult};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::application::commands::retry::SharedRetryEngine;
use crate::application::events::{Event, EventMessage, SharedEventBus};
use crate::application::services::ChargePointService;
use crate::support::shutdown::ShutdownSignal;

/// HTTP sink total request timeout.
const HTTP_TIMEOUT_S: u64 = 30;
/// Health check cadence.
const HEALTH_INTERVAL_S: u64 = 60;
/// BRPOP wait on the command queue.
const COMMAND_POLL_TIMEOUT_S: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the back-office API (events go to `<base>/ocpp/events`).
    pub api_url: String,
    pub api_key: String,
    /// Queue endpoint; `None` runs the bridge HTTP-only.
    pub redis_url: Option<String>,
    /// Queue name prefix (`<exchange>:events`, `<exchange>:commands`, ...).
    pub exchange: String,
}

/// Event payload shipped to the sink.
#[derive(Debug, Clone, Serialize)]
struct SinkEvent {
    event_type: String,
    charger_id: String,
    data: Value,
    timestamp: chrono::DateTime<Utc>,
    source: &'static str,
}

impl SinkEvent {
    fn new(event_type: &str, charger_id: &str, data: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            charger_id: charger_id.to_string(),
            data,
            timestamp: Utc::now(),
            source: "ocpp_service",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeStats {
    pub events_sent: u64,
    pub events_failed: u64,
    pub http_requests: u64,
    pub http_errors: u64,
    pub queue_size: u64,
}

pub struct EventBridge {
    config: BridgeConfig,
    http: reqwest::Client,
    redis: Option<redis::Client>,
    engine: SharedRetryEngine,
    service: Arc<ChargePointService>,

    events_sent: AtomicU64,
    events_failed: AtomicU64,
    http_requests: AtomicU64,
    http_errors: AtomicU64,
    queue_size: AtomicU64,
}

impl EventBridge {
    pub fn new(
        config: BridgeConfig,
        engine: SharedRetryEngine,
        service: Arc<ChargePointService>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_S))
            .build()
            .expect("reqwest client");

        let redis = match &config.redis_url {
            Some(url) => match redis::Client::open(url.as_str()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Invalid Redis URL, bridge runs HTTP-only");
                    None
                }
            },
            None => {
                info!("No queue endpoint configured, bridge runs HTTP-only");
                None
            }
        };

        Self {
            config,
            http,
            redis,
            engine,
            service,
            events_sent: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            http_errors: AtomicU64::new(0),
            queue_size: AtomicU64::new(0),
        }
    }

    /// Spawn the bridge tasks: bus consumer, command listener, health loop.
    pub fn start(self: &Arc<Self>, event_bus: SharedEventBus, shutdown: ShutdownSignal) {
        let bridge = Arc::clone(self);
        let consumer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            info!("Event bridge started");
            let mut subscriber = event_bus.subscribe();
            loop {
                tokio::select! {
                    message = subscriber.recv() => {
                        match message {
                            Some(message) => bridge.handle_bus_event(&message).await,
                            None => break,
                        }
                    }
                    _ = consumer_shutdown.notified().wait() => {
                        info!("Event bridge shutting down");
                        break;
                    }
                }
            }
        });

        let bridge = Arc::clone(self);
        let listener_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                if listener_shutdown.is_triggered() {
                    break;
                }
                bridge.poll_command_queue().await;
            }
        });

        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(HEALTH_INTERVAL_S));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        bridge.health_check().await;
                    }
                    _ = shutdown.notified().wait() => {
                        break;
                    }
                }
            }
        });
    }

    // ── Event delivery ─────────────────────────────────────

    async fn handle_bus_event(&self, message: &EventMessage) {
        let charger_id = message.event.charger_id().to_string();

        let (event_type, data) = match &message.event {
            Event::BootNotification(e) => (
                "boot_notification",
                json!({
                    "vendor": e.vendor,
                    "model": e.model,
                    "serial_number": e.serial_number,
                    "firmware_version": e.firmware_version,
                }),
            ),
            Event::TransactionStarted(e) => (
                "transaction_start",
                json!({
                    "transaction_id": e.transaction_id,
                    "connector_id": e.connector_id,
                    "id_tag": e.id_tag,
                    "start_time": e.start_time,
                    "meter_start": e.meter_start,
                }),
            ),
            Event::TransactionStopped(e) => (
                "transaction_stop",
                json!({
                    "transaction_id": e.transaction_id,
                    "connector_id": e.connector_id,
                    "id_tag": e.id_tag,
                    "stop_time": e.stop_time,
                    "duration": e.duration_s,
                    "energy_delivered": e.energy_delivered_kwh,
                    "cost": e.cost,
                    "meter_stop": e.meter_stop,
                }),
            ),
            Event::StatusNotification(e) => {
                if e.is_fault() {
                    self.send_event(SinkEvent::new(
                        "fault_notification",
                        &charger_id,
                        json!({
                            "connector_id": e.connector_id,
                            "error_code": e.error_code,
                            "info": e.info,
                            "timestamp": message.timestamp,
                        }),
                    ))
                    .await;
                }
                (
                    "status_notification",
                    json!({
                        "connector_id": e.connector_id,
                        "status": e.status,
                        "error_code": e.error_code,
                    }),
                )
            }
            Event::MeterValuesReceived(e) => (
                "meter_values",
                json!({
                    "transaction_id": e.transaction_id,
                    "connector_id": e.connector_id,
                    "energy_kwh": e.energy_kwh,
                    "power_kw": e.power_kw,
                    "timestamp": message.timestamp,
                }),
            ),
            Event::HeartbeatReceived(_) => (
                "heartbeat",
                json!({ "timestamp": message.timestamp }),
            ),
            Event::RemoteCommandResult(e) => (
                "remote_command_result",
                json!({
                    "command": e.command,
                    "message_id": e.message_id,
                    "status": e.status,
                    "response": e.response,
                    "timestamp": message.timestamp,
                }),
            ),
            // Connection lifecycle stays internal to the projector.
            Event::ChargerConnected(_) | Event::ChargerDisconnected(_) => return,
        };

        self.send_event(SinkEvent::new(event_type, &charger_id, data))
            .await;
    }

    async fn send_event(&self, event: SinkEvent) {
        if self.send_via_http(&event).await {
            self.events_sent.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ocpp_bridge_events_sent_total").increment(1);
            return;
        }

        if self.send_via_queue(&event).await {
            self.events_sent.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ocpp_bridge_events_sent_total").increment(1);
        } else {
            self.events_failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ocpp_bridge_events_failed_total").increment(1);
        }
    }

    async fn send_via_http(&self, event: &SinkEvent) -> bool {
        let url = format!("{}/ocpp/events", self.config.api_url);
        self.http_requests.fetch_add(1, Ordering::Relaxed);

        let result = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(event)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(event_type = event.event_type.as_str(), "Event sent via HTTP");
                true
            }
            Ok(response) => {
                warn!(
                    status = %response.status(),
                    event_type = event.event_type.as_str(),
                    "Event sink rejected event"
                );
                self.http_errors.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(e) => {
                warn!(error = %e, event_type = event.event_type.as_str(), "Event sink unreachable");
                self.http_errors.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    async fn send_via_queue(&self, event: &SinkEvent) -> bool {
        let Some(client) = &self.redis else {
            return false;
        };
        let queue = format!("{}:events", self.config.exchange);
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(_) => return false,
        };

        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                use redis::AsyncCommands;
                match conn.lpush::<_, _, ()>(&queue, payload).await {
                    Ok(()) => {
                        debug!(event_type = event.event_type.as_str(), "Event queued");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "Queue push failed");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Queue unavailable");
                false
            }
        }
    }

    // ── Inbound command queue ──────────────────────────────

    async fn poll_command_queue(&self) {
        let Some(client) = &self.redis else {
            tokio::time::sleep(Duration::from_secs(1)).await;
            return;
        };

        let queue = format!("{}:commands", self.config.exchange);
        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(_) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                return;
            }
        };

        use redis::AsyncCommands;
        let popped: Option<(String, String)> = conn
            .brpop(&queue, COMMAND_POLL_TIMEOUT_S)
            .await
            .unwrap_or(None);
        let Some((_, raw)) = popped else {
            return;
        };

        let request: CommandRequest = match serde_json::from_str(&raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Unparseable back-office command");
                return;
            }
        };

        let require_response = request.require_response;
        let request_id = request.request_id.clone();
        let result = commands::dispatch(&self.engine, &self.service, request).await;

        if require_response {
            if let Some(request_id) = request_id {
                let response_queue =
                    format!("{}:responses:{}", self.config.exchange, request_id);
                if let Ok(payload) = serde_json::to_string(&result) {
                    let _: Result<(), _> = conn.lpush(&response_queue, payload).await;
                }
            }
        }
    }

    // ── Health ─────────────────────────────────────────────

    async fn health_check(&self) {
        if let Some(client) = &self.redis {
            match client.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    let pong: Result<String, _> =
                        redis::cmd("PING").query_async(&mut conn).await;
                    if let Err(e) = pong {
                        warn!(error = %e, "Queue health check failed");
                    }

                    use redis::AsyncCommands;
                    let queue = format!("{}:events", self.config.exchange);
                    if let Ok(len) = conn.llen::<_, u64>(&queue).await {
                        self.queue_size.store(len, Ordering::Relaxed);
                        metrics::gauge!("ocpp_bridge_queue_size").set(len as f64);
                    }
                }
                Err(e) => warn!(error = %e, "Queue health check failed"),
            }
        }

        let url = format!("{}/health", self.config.api_url);
        self.http_requests.fetch_add(1, Ordering::Relaxed);
        match self.http.get(&url).bearer_auth(&self.config.api_key).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), "Event sink health check failed");
                self.http_errors.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(error = %e, "Event sink health check failed");
                self.http_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
            http_errors: self.http_errors.load(Ordering::Relaxed),
            queue_size: self.queue_size.load(Ordering::Relaxed),
        }
    }

    pub fn queue_enabled(&self) -> bool {
        self.redis.is_some()
    }
}

pub type SharedEventBridge = Arc<EventBridge>;
