//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::repositories::{
    ChargerRepository, ConnectionEventRepository, ConnectorRepository, MessageLogRepository,
    RepositoryProvider, RfidCardRepository, SessionRepository, SystemConfigRepository,
    UserRepository,
};

use super::{
    SeaOrmChargerRepository, SeaOrmConnectionEventRepository, SeaOrmConnectorRepository,
    SeaOrmMessageLogRepository, SeaOrmRfidCardRepository, SeaOrmSessionRepository,
    SeaOrmSystemConfigRepository, SeaOrmUserRepository,
};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
pub struct SeaOrmRepositoryProvider {
    chargers: SeaOrmChargerRepository,
    connectors: SeaOrmConnectorRepository,
    sessions: SeaOrmSessionRepository,
    message_logs: SeaOrmMessageLogRepository,
    connection_events: SeaOrmConnectionEventRepository,
    rfid_cards: SeaOrmRfidCardRepository,
    users: SeaOrmUserRepository,
    system_config: SeaOrmSystemConfigRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            chargers: SeaOrmChargerRepository::new(db.clone()),
            connectors: SeaOrmConnectorRepository::new(db.clone()),
            sessions: SeaOrmSessionRepository::new(db.clone()),
            message_logs: SeaOrmMessageLogRepository::new(db.clone()),
            connection_events: SeaOrmConnectionEventRepository::new(db.clone()),
            rfid_cards: SeaOrmRfidCardRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db.clone()),
            system_config: SeaOrmSystemConfigRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn chargers(&self) -> &dyn ChargerRepository {
        &self.chargers
    }

    fn connectors(&self) -> &dyn ConnectorRepository {
        &self.connectors
    }

    fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }

    fn message_logs(&self) -> &dyn MessageLogRepository {
        &self.message_logs
    }

    fn connection_events(&self) -> &dyn ConnectionEventRepository {
        &self.connection_events
    }

    fn rfid_cards(&self) -> &dyn RfidCardRepository {
        &self.rfid_cards
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn system_config(&self) -> &dyn SystemConfigRepository {
        &self.system_config
    }
}
