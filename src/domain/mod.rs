//! Core business entities, value objects and repository traits.

pub mod charger;
pub mod connection_event;
pub mod connector;
pub mod message_log;
pub mod repositories;
pub mod rfid_card;
pub mod session;
pub mod system_config;
pub mod user;

pub use charger::{Charger, ChargerStatus, RetryPolicy};
pub use connection_event::{ConnectionEvent, ConnectionEventType};
pub use connector::Connector;
pub use message_log::{LogDirection, LogStatus, MessageLog};
pub use repositories::{
    ChargerRepository, ConnectionEventRepository, ConnectorRepository, MessageLogRepository,
    RepositoryProvider, RfidCardRepository, SessionRepository, SystemConfigRepository,
    UserRepository,
};
pub use rfid_card::{AuthorizationStatus, RfidCard};
pub use session::{ChargingSession, SessionStatus};
pub use system_config::SystemConfigEntry;
pub use user::{User, UserRole};
