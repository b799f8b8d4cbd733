//! SeaORM repository implementations

mod charger_repository;
mod connection_event_repository;
mod connector_repository;
mod message_log_repository;
mod provider;
mod rfid_card_repository;
mod session_repository;
mod system_config_repository;
mod user_repository;

pub use charger_repository::SeaOrmChargerRepository;
pub use connection_event_repository::SeaOrmConnectionEventRepository;
pub use connector_repository::SeaOrmConnectorRepository;
pub use message_log_repository::SeaOrmMessageLogRepository;
pub use provider::SeaOrmRepositoryProvider;
pub use rfid_card_repository::SeaOrmRfidCardRepository;
pub use session_repository::SeaOrmSessionRepository;
pub use system_config_repository::SeaOrmSystemConfigRepository;
pub use user_repository::SeaOrmUserRepository;
