//! Charge point service
//!
//! Persistence orchestration behind the OCPP handlers: charger lifecycle,
//! connector state, transaction allocation and authorization.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, warn};

use crate::domain::charger::Charger;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::rfid_card::{authorization_status, AuthorizationStatus};
use crate::domain::session::{ChargingSession, DEFAULT_RATE_PER_KWH};
use crate::domain::system_config::keys;
use crate::support::errors::DomainResult;

/// Advertised heartbeat interval fallback when system_config has no row.
const DEFAULT_HEARTBEAT_INTERVAL_S: u32 = 60;

pub struct ChargePointService {
    repos: Arc<dyn RepositoryProvider>,
    /// Per-charger OCPP transaction counters. Seeded lazily from the store
    /// so ids stay monotone across restarts with a surviving database.
    transaction_counters: DashMap<String, i32>,
    rate_per_kwh: f64,
}

impl ChargePointService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            transaction_counters: DashMap::new(),
            rate_per_kwh: DEFAULT_RATE_PER_KWH,
        }
    }

    pub fn with_rate(mut self, rate_per_kwh: f64) -> Self {
        self.rate_per_kwh = rate_per_kwh;
        self
    }

    pub fn rate_per_kwh(&self) -> f64 {
        self.rate_per_kwh
    }

    pub fn repos(&self) -> &Arc<dyn RepositoryProvider> {
        &self.repos
    }

    // ── Charger lifecycle ──────────────────────────────────

    /// Called on WebSocket upgrade: creates the charger row on first contact
    /// or flips an existing one to connected.
    pub async fn mark_connected(&self, charger_id: &str) -> DomainResult<()> {
        match self.repos.chargers().find_by_id(charger_id).await? {
            Some(_) => self.repos.chargers().set_connected(charger_id, true).await,
            None => {
                info!(charger_id, "First contact, registering charger");
                self.repos.chargers().insert(Charger::unknown(charger_id)).await
            }
        }
    }

    pub async fn mark_disconnected(&self, charger_id: &str) -> DomainResult<()> {
        self.repos.chargers().set_connected(charger_id, false).await
    }

    /// Persist BootNotification descriptive fields; returns the heartbeat
    /// interval to advertise.
    pub async fn handle_boot(
        &self,
        charger_id: &str,
        vendor: Option<String>,
        model: Option<String>,
        serial_number: Option<String>,
        firmware_version: Option<String>,
    ) -> DomainResult<u32> {
        let mut charger = match self.repos.chargers().find_by_id(charger_id).await? {
            Some(cp) => cp,
            None => {
                let cp = Charger::unknown(charger_id);
                self.repos.chargers().insert(cp.clone()).await?;
                cp
            }
        };
        charger.apply_boot(vendor, model, serial_number, firmware_version);
        self.repos.chargers().update(charger).await?;

        Ok(self.heartbeat_interval().await)
    }

    pub async fn heartbeat_interval(&self) -> u32 {
        match self.repos.system_config().get(keys::HEARTBEAT_INTERVAL).await {
            Ok(Some(entry)) => entry
                .value_as_u32()
                .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_S),
            _ => DEFAULT_HEARTBEAT_INTERVAL_S,
        }
    }

    pub async fn record_heartbeat(&self, charger_id: &str) -> DomainResult<()> {
        self.repos.chargers().touch_heartbeat(charger_id).await
    }

    // ── Connectors ─────────────────────────────────────────

    pub async fn apply_status_notification(
        &self,
        charger_id: &str,
        connector_id: i32,
        status: &str,
        error_code: Option<String>,
    ) -> DomainResult<()> {
        self.repos
            .connectors()
            .upsert_status(charger_id, connector_id, status, error_code)
            .await
    }

    pub async fn apply_meter_sample(
        &self,
        charger_id: &str,
        connector_id: i32,
        energy_kwh: Option<f64>,
        power_kw: Option<f64>,
    ) -> DomainResult<()> {
        self.repos
            .connectors()
            .update_measurements(charger_id, connector_id, energy_kwh, power_kw)
            .await
    }

    // ── Transactions ───────────────────────────────────────

    /// Next per-charger transaction id (monotone, >= 1). The counter is
    /// seeded from the highest persisted id for the charger on first use.
    async fn next_transaction_id(&self, charger_id: &str) -> i32 {
        if !self.transaction_counters.contains_key(charger_id) {
            let seed = self
                .repos
                .sessions()
                .max_transaction_id(charger_id)
                .await
                .ok()
                .flatten()
                .unwrap_or(0);
            self.transaction_counters
                .entry(charger_id.to_string())
                .or_insert(seed);
        }

        let mut counter = self
            .transaction_counters
            .get_mut(charger_id)
            .expect("counter just seeded");
        *counter += 1;
        *counter
    }

    /// StartTransaction: allocates the transaction id and creates the Active
    /// session. A lingering Active session for the same charger is closed as
    /// Faulted first, keeping at most one Active per charger.
    pub async fn start_transaction(
        &self,
        charger_id: &str,
        connector_id: i32,
        id_tag: Option<String>,
        meter_start: f64,
    ) -> DomainResult<ChargingSession> {
        for mut lingering in self
            .repos
            .sessions()
            .find_active_for_charger(charger_id)
            .await?
        {
            warn!(
                charger_id,
                transaction_id = ?lingering.transaction_id,
                "New StartTransaction with a lingering Active session, closing it as Faulted"
            );
            lingering.fault();
            self.repos.sessions().update(lingering).await?;
        }

        let transaction_id = self.next_transaction_id(charger_id).await;
        let session = ChargingSession::start(
            charger_id,
            connector_id,
            transaction_id,
            id_tag,
            meter_start,
        );
        let session = self.repos.sessions().insert(session).await?;
        info!(
            charger_id,
            transaction_id,
            session_id = session.id,
            "Transaction started"
        );
        Ok(session)
    }

    /// StopTransaction: closes the session and derives energy and cost.
    /// Returns `None` for an unknown transaction (the CP is still answered
    /// Accepted).
    pub async fn stop_transaction(
        &self,
        charger_id: &str,
        transaction_id: i32,
        meter_stop: f64,
    ) -> DomainResult<Option<ChargingSession>> {
        let Some(mut session) = self
            .repos
            .sessions()
            .find_by_transaction(charger_id, transaction_id)
            .await?
        else {
            warn!(charger_id, transaction_id, "StopTransaction for unknown transaction");
            return Ok(None);
        };

        session.stop(meter_stop, self.rate_per_kwh);
        self.repos.sessions().update(session.clone()).await?;
        info!(
            charger_id,
            transaction_id,
            energy_kwh = session.energy_delivered_kwh,
            cost = session.cost,
            "Transaction stopped"
        );
        Ok(Some(session))
    }

    /// Most recent Active session, used by the admin remote-stop path.
    pub async fn latest_active_session(
        &self,
        charger_id: &str,
    ) -> DomainResult<Option<ChargingSession>> {
        Ok(self
            .repos
            .sessions()
            .find_active_for_charger(charger_id)
            .await?
            .into_iter()
            .next())
    }

    // ── Authorization ──────────────────────────────────────

    pub async fn authorize(&self, id_tag: &str) -> DomainResult<AuthorizationStatus> {
        let card = self.repos.rfid_cards().find_by_tag(id_tag).await?;
        Ok(authorization_status(card.as_ref(), Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rfid_card::RfidCard;
    use crate::domain::session::SessionStatus;
    use crate::infrastructure::storage::MemoryRepositoryProvider;

    fn service() -> ChargePointService {
        ChargePointService::new(Arc::new(MemoryRepositoryProvider::new()))
    }

    #[tokio::test]
    async fn transaction_ids_are_monotone_per_charger() {
        let service = service();
        let a = service
            .start_transaction("CP001", 1, Some("T".into()), 0.0)
            .await
            .unwrap();
        let b = service
            .start_transaction("CP001", 1, Some("T".into()), 0.0)
            .await
            .unwrap();
        let other = service
            .start_transaction("CP002", 1, None, 0.0)
            .await
            .unwrap();

        assert_eq!(a.transaction_id, Some(1));
        assert_eq!(b.transaction_id, Some(2));
        assert_eq!(other.transaction_id, Some(1));
    }

    #[tokio::test]
    async fn counter_seeds_from_persisted_sessions() {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let mut old = ChargingSession::start("CP001", 1, 41, None, 0.0);
        old.stop(1000.0, DEFAULT_RATE_PER_KWH);
        repos.sessions().insert(old).await.unwrap();

        let service = ChargePointService::new(repos);
        let session = service
            .start_transaction("CP001", 1, None, 0.0)
            .await
            .unwrap();
        assert_eq!(session.transaction_id, Some(42));
    }

    #[tokio::test]
    async fn second_start_faults_lingering_active() {
        let service = service();
        let first = service
            .start_transaction("CP001", 1, None, 100.0)
            .await
            .unwrap();
        let _second = service
            .start_transaction("CP001", 1, None, 200.0)
            .await
            .unwrap();

        let active = service
            .repos()
            .sessions()
            .find_active_for_charger("CP001")
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let faulted = service
            .repos()
            .sessions()
            .find_by_transaction("CP001", first.transaction_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(faulted.status, SessionStatus::Faulted);
    }

    #[tokio::test]
    async fn stop_transaction_computes_energy_and_cost() {
        let service = service();
        let session = service
            .start_transaction("CP001", 1, Some("T".into()), 1000.0)
            .await
            .unwrap();

        let stopped = service
            .stop_transaction("CP001", session.transaction_id.unwrap(), 2500.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stopped.status, SessionStatus::Completed);
        assert!((stopped.energy_delivered_kwh - 1.5).abs() < 1e-9);
        assert!((stopped.cost - 0.225).abs() < 1e-9);
    }

    #[tokio::test]
    async fn stop_unknown_transaction_is_none() {
        let service = service();
        assert!(service
            .stop_transaction("CP001", 99, 100.0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn authorize_consults_cards() {
        let service = service();
        assert_eq!(
            service.authorize("UNKNOWN").await.unwrap(),
            AuthorizationStatus::Invalid
        );

        let mut card = RfidCard::new("GOOD");
        service.repos().rfid_cards().insert(card.clone()).await.unwrap();
        assert_eq!(
            service.authorize("GOOD").await.unwrap(),
            AuthorizationStatus::Accepted
        );

        card.is_blocked = true;
        service.repos().rfid_cards().update(card).await.unwrap();
        assert_eq!(
            service.authorize("GOOD").await.unwrap(),
            AuthorizationStatus::Blocked
        );
    }

    #[tokio::test]
    async fn mark_connected_registers_unknown_charger() {
        let service = service();
        service.mark_connected("CP900").await.unwrap();
        let charger = service
            .repos()
            .chargers()
            .find_by_id("CP900")
            .await
            .unwrap()
            .unwrap();
        assert!(charger.is_connected);
    }
}
