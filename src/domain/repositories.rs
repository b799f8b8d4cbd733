//! Repository traits
//!
//! Persistence access for the entities in this module. Implementations live
//! in `infrastructure`; handlers and services depend only on these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::support::errors::DomainResult;

use super::charger::{Charger, ChargerStatus, RetryPolicy};
use super::connection_event::ConnectionEvent;
use super::connector::Connector;
use super::message_log::MessageLog;
use super::rfid_card::RfidCard;
use super::session::ChargingSession;
use super::system_config::SystemConfigEntry;
use super::user::User;

#[async_trait]
pub trait ChargerRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Charger>>;
    async fn list(&self) -> DomainResult<Vec<Charger>>;
    async fn insert(&self, charger: Charger) -> DomainResult<()>;
    async fn update(&self, charger: Charger) -> DomainResult<()>;
    /// Flip the connection flag, stamping connection/disconnect time.
    async fn set_connected(&self, id: &str, connected: bool) -> DomainResult<()>;
    async fn touch_heartbeat(&self, id: &str) -> DomainResult<()>;
    async fn update_status(&self, id: &str, status: ChargerStatus) -> DomainResult<()>;
    async fn update_retry_policy(&self, id: &str, policy: RetryPolicy) -> DomainResult<()>;
}

#[async_trait]
pub trait ConnectorRepository: Send + Sync {
    async fn find(&self, charger_id: &str, connector_id: i32) -> DomainResult<Option<Connector>>;
    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<Connector>>;
    /// Create-or-update the connector's status/error_code.
    async fn upsert_status(
        &self,
        charger_id: &str,
        connector_id: i32,
        status: &str,
        error_code: Option<String>,
    ) -> DomainResult<()>;
    async fn update_measurements(
        &self,
        charger_id: &str,
        connector_id: i32,
        energy_kwh: Option<f64>,
        power_kw: Option<f64>,
    ) -> DomainResult<()>;
    async fn delete(&self, charger_id: &str, connector_id: i32) -> DomainResult<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert and return the session with its surrogate id populated.
    async fn insert(&self, session: ChargingSession) -> DomainResult<ChargingSession>;
    async fn update(&self, session: ChargingSession) -> DomainResult<()>;
    async fn find_by_transaction(
        &self,
        charger_id: &str,
        transaction_id: i32,
    ) -> DomainResult<Option<ChargingSession>>;
    /// All Active sessions for a charger, most recent start first.
    async fn find_active_for_charger(&self, charger_id: &str)
        -> DomainResult<Vec<ChargingSession>>;
    async fn has_active_for_connector(
        &self,
        charger_id: &str,
        connector_id: i32,
    ) -> DomainResult<bool>;
    /// Highest transaction id ever allocated for this charger.
    async fn max_transaction_id(&self, charger_id: &str) -> DomainResult<Option<i32>>;
    async fn list_for_charger(&self, charger_id: &str) -> DomainResult<Vec<ChargingSession>>;
    /// Sessions started at or after `since` (projector's daily statistics).
    async fn started_since(
        &self,
        charger_id: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<ChargingSession>>;
}

#[async_trait]
pub trait MessageLogRepository: Send + Sync {
    /// Append-only; implementations retry once and drop on repeated failure
    /// so the protocol hot path never stalls on logging.
    async fn append(&self, log: MessageLog);
    async fn list(&self, charger_id: Option<&str>, limit: u64) -> DomainResult<Vec<MessageLog>>;
    /// Writes dropped after the retry budget (observability counter).
    fn dropped_writes(&self) -> u64;
}

#[async_trait]
pub trait ConnectionEventRepository: Send + Sync {
    /// Append-only; same drop-on-repeated-failure contract as MessageLog.
    async fn append(&self, event: ConnectionEvent);
    async fn latest_for_charger(&self, charger_id: &str) -> DomainResult<Option<ConnectionEvent>>;
    async fn list(&self, charger_id: Option<&str>, limit: u64)
        -> DomainResult<Vec<ConnectionEvent>>;
}

#[async_trait]
pub trait RfidCardRepository: Send + Sync {
    async fn find_by_tag(&self, id_tag: &str) -> DomainResult<Option<RfidCard>>;
    async fn list(&self) -> DomainResult<Vec<RfidCard>>;
    async fn insert(&self, card: RfidCard) -> DomainResult<RfidCard>;
    async fn update(&self, card: RfidCard) -> DomainResult<()>;
    async fn delete(&self, id_tag: &str) -> DomainResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn list(&self) -> DomainResult<Vec<User>>;
    async fn insert(&self, user: User) -> DomainResult<User>;
    async fn update(&self, user: User) -> DomainResult<()>;
    async fn count(&self) -> DomainResult<u64>;
}

#[async_trait]
pub trait SystemConfigRepository: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<SystemConfigEntry>>;
    async fn set(&self, entry: SystemConfigEntry) -> DomainResult<()>;
    async fn list(&self) -> DomainResult<Vec<SystemConfigEntry>>;
    /// Write the default rows if the table is empty.
    async fn seed_defaults(&self) -> DomainResult<()>;
}

/// Unified accessor over all repositories. One implementation per backing
/// store (SeaORM, in-memory for tests).
pub trait RepositoryProvider: Send + Sync {
    fn chargers(&self) -> &dyn ChargerRepository;
    fn connectors(&self) -> &dyn ConnectorRepository;
    fn sessions(&self) -> &dyn SessionRepository;
    fn message_logs(&self) -> &dyn MessageLogRepository;
    fn connection_events(&self) -> &dyn ConnectionEventRepository;
    fn rfid_cards(&self) -> &dyn RfidCardRepository;
    fn users(&self) -> &dyn UserRepository;
    fn system_config(&self) -> &dyn SystemConfigRepository;
}
