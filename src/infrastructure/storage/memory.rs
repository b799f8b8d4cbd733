//! In-memory repository provider
//!
//! Backs unit tests of handlers, services and the projector without a
//! database. Mirrors the SeaORM provider's observable behavior (surrogate
//! ids, uniqueness, ordering) closely enough for the invariants under test.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::charger::{Charger, ChargerStatus, RetryPolicy};
use crate::domain::connection_event::ConnectionEvent;
use crate::domain::connector::Connector;
use crate::domain::message_log::MessageLog;
use crate::domain::repositories::{
    ChargerRepository, ConnectionEventRepository, ConnectorRepository, MessageLogRepository,
    RepositoryProvider, RfidCardRepository, SessionRepository, SystemConfigRepository,
    UserRepository,
};
use crate::domain::rfid_card::RfidCard;
use crate::domain::session::{ChargingSession, SessionStatus};
use crate::domain::system_config::{default_entries, SystemConfigEntry};
use crate::domain::user::User;
use crate::support::errors::{DomainError, DomainResult};

#[derive(Default)]
pub struct MemoryRepositoryProvider {
    chargers: DashMap<String, Charger>,
    connectors: DashMap<(String, i32), Connector>,
    sessions: Mutex<Vec<ChargingSession>>,
    session_seq: AtomicI32,
    message_logs: Mutex<Vec<MessageLog>>,
    connection_events: Mutex<Vec<ConnectionEvent>>,
    rfid_cards: DashMap<String, RfidCard>,
    users: Mutex<Vec<User>>,
    user_seq: AtomicI32,
    system_config: DashMap<String, SystemConfigEntry>,
    dropped_log_writes: AtomicU64,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for MemoryRepositoryProvider {
    fn chargers(&self) -> &dyn ChargerRepository {
        self
    }

    fn connectors(&self) -> &dyn ConnectorRepository {
        self
    }

    fn sessions(&self) -> &dyn SessionRepository {
        self
    }

    fn message_logs(&self) -> &dyn MessageLogRepository {
        self
    }

    fn connection_events(&self) -> &dyn ConnectionEventRepository {
        self
    }

    fn rfid_cards(&self) -> &dyn RfidCardRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn system_config(&self) -> &dyn SystemConfigRepository {
        self
    }
}

#[async_trait]
impl ChargerRepository for MemoryRepositoryProvider {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Charger>> {
        Ok(self.chargers.get(id).map(|e| e.value().clone()))
    }

    async fn list(&self) -> DomainResult<Vec<Charger>> {
        Ok(self.chargers.iter().map(|e| e.value().clone()).collect())
    }

    async fn insert(&self, charger: Charger) -> DomainResult<()> {
        if self.chargers.contains_key(&charger.id) {
            return Err(DomainError::Conflict(charger.id));
        }
        self.chargers.insert(charger.id.clone(), charger);
        Ok(())
    }

    async fn update(&self, charger: Charger) -> DomainResult<()> {
        if !self.chargers.contains_key(&charger.id) {
            return Err(DomainError::NotFound {
                entity: "Charger",
                field: "id",
                value: charger.id,
            });
        }
        self.chargers.insert(charger.id.clone(), charger);
        Ok(())
    }

    async fn set_connected(&self, id: &str, connected: bool) -> DomainResult<()> {
        let mut entry = self.chargers.get_mut(id).ok_or(DomainError::NotFound {
            entity: "Charger",
            field: "id",
            value: id.to_string(),
        })?;
        entry.is_connected = connected;
        if connected {
            entry.connection_time = Some(Utc::now());
        } else {
            entry.disconnect_time = Some(Utc::now());
        }
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_heartbeat(&self, id: &str) -> DomainResult<()> {
        let mut entry = self.chargers.get_mut(id).ok_or(DomainError::NotFound {
            entity: "Charger",
            field: "id",
            value: id.to_string(),
        })?;
        entry.touch_heartbeat();
        Ok(())
    }

    async fn update_status(&self, id: &str, status: ChargerStatus) -> DomainResult<()> {
        if let Some(mut entry) = self.chargers.get_mut(id) {
            entry.status = status;
            entry.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_retry_policy(&self, id: &str, policy: RetryPolicy) -> DomainResult<()> {
        policy.validate().map_err(DomainError::Validation)?;
        let mut entry = self.chargers.get_mut(id).ok_or(DomainError::NotFound {
            entity: "Charger",
            field: "id",
            value: id.to_string(),
        })?;
        entry.retry_policy = policy;
        Ok(())
    }
}

#[async_trait]
impl ConnectorRepository for MemoryRepositoryProvider {
    async fn find(&self, charger_id: &str, connector_id: i32) -> DomainResult<Option<Connector>> {
        Ok(self
            .connectors
            .get(&(charger_id.to_string(), connector_id))
            .map(|e| e.value().clone()))
    }

    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<Connector>> {
        Ok(self
            .connectors
            .iter()
            .filter(|e| e.key().0 == charger_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn upsert_status(
        &self,
        charger_id: &str,
        connector_id: i32,
        status: &str,
        error_code: Option<String>,
    ) -> DomainResult<()> {
        let key = (charger_id.to_string(), connector_id);
        let mut connector = self
            .connectors
            .get(&key)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| Connector::new(charger_id, connector_id));
        connector.apply_status(status, error_code);
        self.connectors.insert(key, connector);
        Ok(())
    }

    async fn update_measurements(
        &self,
        charger_id: &str,
        connector_id: i32,
        energy_kwh: Option<f64>,
        power_kw: Option<f64>,
    ) -> DomainResult<()> {
        let key = (charger_id.to_string(), connector_id);
        let mut connector = self
            .connectors
            .get(&key)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| Connector::new(charger_id, connector_id));
        if let Some(kwh) = energy_kwh {
            connector.energy_delivered_kwh = kwh;
        }
        if let Some(kw) = power_kw {
            connector.power_delivered_kw = kw;
        }
        connector.updated_at = Utc::now();
        self.connectors.insert(key, connector);
        Ok(())
    }

    async fn delete(&self, charger_id: &str, connector_id: i32) -> DomainResult<()> {
        self.connectors
            .remove(&(charger_id.to_string(), connector_id))
            .map(|_| ())
            .ok_or(DomainError::NotFound {
                entity: "Connector",
                field: "connector_id",
                value: format!("{charger_id}/{connector_id}"),
            })
    }
}

#[async_trait]
impl SessionRepository for MemoryRepositoryProvider {
    async fn insert(&self, mut session: ChargingSession) -> DomainResult<ChargingSession> {
        session.id = self.session_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn update(&self, session: ChargingSession) -> DomainResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(DomainError::NotFound {
                entity: "Session",
                field: "id",
                value: session.id.to_string(),
            }),
        }
    }

    async fn find_by_transaction(
        &self,
        charger_id: &str,
        transaction_id: i32,
    ) -> DomainResult<Option<ChargingSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.charger_id == charger_id && s.transaction_id == Some(transaction_id))
            .cloned())
    }

    async fn find_active_for_charger(
        &self,
        charger_id: &str,
    ) -> DomainResult<Vec<ChargingSession>> {
        let mut active: Vec<ChargingSession> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.charger_id == charger_id && s.status == SessionStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(active)
    }

    async fn has_active_for_connector(
        &self,
        charger_id: &str,
        connector_id: i32,
    ) -> DomainResult<bool> {
        Ok(self.sessions.lock().unwrap().iter().any(|s| {
            s.charger_id == charger_id
                && s.connector_id == Some(connector_id)
                && s.status == SessionStatus::Active
        }))
    }

    async fn max_transaction_id(&self, charger_id: &str) -> DomainResult<Option<i32>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.charger_id == charger_id)
            .filter_map(|s| s.transaction_id)
            .max())
    }

    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<ChargingSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.charger_id == charger_id)
            .cloned()
            .collect())
    }

    async fn started_since(
        &self,
        charger_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ChargingSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.charger_id == charger_id && s.start_time >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageLogRepository for MemoryRepositoryProvider {
    async fn append(&self, log: MessageLog) {
        self.message_logs.lock().unwrap().push(log);
    }

    async fn list(&self, charger_id: Option<&str>, limit: u64) -> DomainResult<Vec<MessageLog>> {
        let logs = self.message_logs.lock().unwrap();
        let mut selected: Vec<MessageLog> = logs
            .iter()
            .filter(|l| charger_id.map_or(true, |id| l.charger_id == id))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        selected.truncate(limit as usize);
        Ok(selected)
    }

    fn dropped_writes(&self) -> u64 {
        self.dropped_log_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionEventRepository for MemoryRepositoryProvider {
    async fn append(&self, event: ConnectionEvent) {
        self.connection_events.lock().unwrap().push(event);
    }

    async fn latest_for_charger(&self, charger_id: &str) -> DomainResult<Option<ConnectionEvent>> {
        Ok(self
            .connection_events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.charger_id == charger_id)
            .last()
            .cloned())
    }

    async fn list(
        &self,
        charger_id: Option<&str>,
        limit: u64,
    ) -> DomainResult<Vec<ConnectionEvent>> {
        let events = self.connection_events.lock().unwrap();
        let mut selected: Vec<ConnectionEvent> = events
            .iter()
            .filter(|e| charger_id.map_or(true, |id| e.charger_id == id))
            .cloned()
            .collect();
        selected.reverse();
        selected.truncate(limit as usize);
        Ok(selected)
    }
}

#[async_trait]
impl RfidCardRepository for MemoryRepositoryProvider {
    async fn find_by_tag(&self, id_tag: &str) -> DomainResult<Option<RfidCard>> {
        Ok(self.rfid_cards.get(id_tag).map(|e| e.value().clone()))
    }

    async fn list(&self) -> DomainResult<Vec<RfidCard>> {
        Ok(self.rfid_cards.iter().map(|e| e.value().clone()).collect())
    }

    async fn insert(&self, card: RfidCard) -> DomainResult<RfidCard> {
        if self.rfid_cards.contains_key(&card.id_tag) {
            return Err(DomainError::Conflict(card.id_tag));
        }
        self.rfid_cards.insert(card.id_tag.clone(), card.clone());
        Ok(card)
    }

    async fn update(&self, card: RfidCard) -> DomainResult<()> {
        if !self.rfid_cards.contains_key(&card.id_tag) {
            return Err(DomainError::NotFound {
                entity: "RfidCard",
                field: "id_tag",
                value: card.id_tag,
            });
        }
        self.rfid_cards.insert(card.id_tag.clone(), card);
        Ok(())
    }

    async fn delete(&self, id_tag: &str) -> DomainResult<()> {
        self.rfid_cards
            .remove(id_tag)
            .map(|_| ())
            .ok_or(DomainError::NotFound {
                entity: "RfidCard",
                field: "id_tag",
                value: id_tag.to_string(),
            })
    }
}

#[async_trait]
impl UserRepository for MemoryRepositoryProvider {
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn insert(&self, mut user: User) -> DomainResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(DomainError::Conflict(user.username));
        }
        user.id = self.user_seq.fetch_add(1, Ordering::SeqCst) + 1;
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> DomainResult<()> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user.id.to_string(),
            }),
        }
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

#[async_trait]
impl SystemConfigRepository for MemoryRepositoryProvider {
    async fn get(&self, key: &str) -> DomainResult<Option<SystemConfigEntry>> {
        Ok(self.system_config.get(key).map(|e| e.value().clone()))
    }

    async fn set(&self, entry: SystemConfigEntry) -> DomainResult<()> {
        self.system_config.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<SystemConfigEntry>> {
        Ok(self
            .system_config
            .iter()
            .map(|e| e.value().clone())
            .collect())
    }

    async fn seed_defaults(&self) -> DomainResult<()> {
        if self.system_config.is_empty() {
            for entry in default_entries() {
                self.system_config.insert(entry.key.clone(), entry);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_ids_are_sequential() {
        let repos = MemoryRepositoryProvider::new();
        let a = repos
            .sessions()
            .insert(ChargingSession::start("CP1", 1, 1, None, 0.0))
            .await
            .unwrap();
        let b = repos
            .sessions()
            .insert(ChargingSession::start("CP1", 1, 2, None, 0.0))
            .await
            .unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn duplicate_charger_insert_conflicts() {
        let repos = MemoryRepositoryProvider::new();
        repos
            .chargers()
            .insert(Charger::unknown("CP1"))
            .await
            .unwrap();
        assert!(matches!(
            repos.chargers().insert(Charger::unknown("CP1")).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn latest_connection_event_wins() {
        let repos = MemoryRepositoryProvider::new();
        repos
            .connection_events()
            .append(ConnectionEvent::new(
                "CP1",
                crate::domain::ConnectionEventType::Connect,
            ))
            .await;
        repos
            .connection_events()
            .append(ConnectionEvent::new(
                "CP1",
                crate::domain::ConnectionEventType::Disconnect,
            ))
            .await;
        let latest = repos
            .connection_events()
            .latest_for_charger("CP1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            latest.event_type,
            crate::domain::ConnectionEventType::Disconnect
        );
    }

    #[tokio::test]
    async fn seed_defaults_is_idempotent() {
        let repos = MemoryRepositoryProvider::new();
        repos.system_config().seed_defaults().await.unwrap();
        let first = repos.system_config().list().await.unwrap().len();
        repos.system_config().seed_defaults().await.unwrap();
        assert_eq!(repos.system_config().list().await.unwrap().len(), first);
    }
}
