//! Liveness monitor
//!
//! Two periodic passes: a heartbeat-timeout check marking silent chargers
//! offline, and a sweep for sockets whose writer task has died. The monitor
//! never sends heartbeats; charge points are the only heartbeat source.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::application::commands::retry::SharedRetryEngine;
use crate::application::registry::SharedConnectionRegistry;
use crate::domain::connection_event::{ConnectionEvent, ConnectionEventType};
use crate::domain::repositories::RepositoryProvider;
use crate::support::errors::DomainResult;
use crate::support::shutdown::ShutdownSignal;

/// Seconds without a heartbeat before a connected charger is marked offline.
pub const HEARTBEAT_TIMEOUT_S: i64 = 600;
/// Heartbeat check cadence.
const HEARTBEAT_CHECK_INTERVAL_S: u64 = 60;
/// Dead-socket sweep cadence.
const SWEEP_INTERVAL_S: u64 = 10;

pub struct LivenessMonitor {
    repos: Arc<dyn RepositoryProvider>,
    registry: SharedConnectionRegistry,
    engine: SharedRetryEngine,
}

impl LivenessMonitor {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        registry: SharedConnectionRegistry,
        engine: SharedRetryEngine,
    ) -> Self {
        Self {
            repos,
            registry,
            engine,
        }
    }

    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) {
        let monitor = Arc::clone(&self);
        let heartbeat_shutdown = shutdown.clone();
        tokio::spawn(async move {
            info!(
                timeout_s = HEARTBEAT_TIMEOUT_S,
                "Heartbeat monitor started"
            );
            let mut interval =
                tokio::time::interval(Duration::from_secs(HEARTBEAT_CHECK_INTERVAL_S));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = monitor.heartbeat_pass().await {
                            warn!(error = %e, "Heartbeat check failed");
                        }
                    }
                    _ = heartbeat_shutdown.notified().wait() => {
                        info!("Heartbeat monitor shutting down");
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_S));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.sweep_dead_sockets().await;
                    }
                    _ = shutdown.notified().wait() => {
                        info!("Dead socket sweeper shutting down");
                        break;
                    }
                }
            }
        });
    }

    /// Mark chargers offline whose heartbeat is older than the timeout.
    pub async fn heartbeat_pass(&self) -> DomainResult<()> {
        let now = Utc::now();
        for charger in self.repos.chargers().list().await? {
            if !charger.is_connected {
                continue;
            }
            let stale = charger
                .seconds_since_heartbeat(now)
                .map(|s| s > HEARTBEAT_TIMEOUT_S)
                .unwrap_or(false);
            if !stale {
                continue;
            }

            warn!(
                charger_id = charger.id.as_str(),
                last_heartbeat = ?charger.last_heartbeat,
                "Heartbeat timeout, marking charger offline"
            );
            self.repos.chargers().set_connected(&charger.id, false).await?;
            self.repos
                .connection_events()
                .append(
                    ConnectionEvent::new(&charger.id, ConnectionEventType::Timeout)
                        .with_reason("Heartbeat timeout"),
                )
                .await;
            metrics::counter!("ocpp_heartbeat_timeouts_total").increment(1);
        }
        Ok(())
    }

    /// Deregister chargers whose writer task is gone (socket closed or
    /// write-broken) that the receive loop has not cleaned up.
    pub async fn sweep_dead_sockets(&self) {
        for charger_id in self.registry.dead_charger_ids() {
            warn!(charger_id = charger_id.as_str(), "Sweeping dead socket");
            if let Some((connection_id, duration)) = self.registry.deregister_cp(&charger_id) {
                if let Err(e) = self.repos.chargers().set_connected(&charger_id, false).await {
                    warn!(charger_id = charger_id.as_str(), error = %e, "Failed to mark swept charger offline");
                }
                self.repos
                    .connection_events()
                    .append(
                        ConnectionEvent::new(&charger_id, ConnectionEventType::Disconnect)
                            .with_connection_id(connection_id)
                            .with_reason("Dead socket sweep")
                            .with_duration(duration),
                    )
                    .await;
                self.engine.on_charger_disconnected(&charger_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::registry::ConnectionRegistry;
    use crate::application::RetryEngine;
    use crate::domain::charger::Charger;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use chrono::Duration as ChronoDuration;

    fn fixture() -> (Arc<MemoryRepositoryProvider>, Arc<LivenessMonitor>, SharedConnectionRegistry) {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
        let engine = Arc::new(RetryEngine::new(
            registry.clone(),
            repos.clone(),
            create_event_bus(),
        ));
        let monitor = Arc::new(LivenessMonitor::new(
            repos.clone(),
            registry.clone(),
            engine,
        ));
        (repos, monitor, registry)
    }

    #[tokio::test]
    async fn stale_heartbeat_marks_offline_with_timeout_event() {
        let (repos, monitor, _registry) = fixture();

        let mut charger = Charger::unknown("CP001");
        charger.last_heartbeat = Some(Utc::now() - ChronoDuration::seconds(HEARTBEAT_TIMEOUT_S + 1));
        repos.chargers().insert(charger).await.unwrap();

        monitor.heartbeat_pass().await.unwrap();

        let charger = repos.chargers().find_by_id("CP001").await.unwrap().unwrap();
        assert!(!charger.is_connected);
        let event = repos
            .connection_events()
            .latest_for_charger("CP001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type, ConnectionEventType::Timeout);
    }

    #[tokio::test]
    async fn fresh_heartbeat_stays_connected() {
        let (repos, monitor, _registry) = fixture();
        repos.chargers().insert(Charger::unknown("CP001")).await.unwrap();

        monitor.heartbeat_pass().await.unwrap();

        let charger = repos.chargers().find_by_id("CP001").await.unwrap().unwrap();
        assert!(charger.is_connected);
    }

    #[tokio::test]
    async fn dead_socket_is_swept_with_disconnect_event() {
        let (repos, monitor, registry) = fixture();
        repos.chargers().insert(Charger::unknown("CP001")).await.unwrap();

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        registry.accept_cp("CP001", tx).unwrap();
        drop(rx);

        monitor.sweep_dead_sockets().await;

        assert!(!registry.is_connected("CP001"));
        let event = repos
            .connection_events()
            .latest_for_charger("CP001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type, ConnectionEventType::Disconnect);
        assert!(event.session_duration_s.is_some());
    }
}
