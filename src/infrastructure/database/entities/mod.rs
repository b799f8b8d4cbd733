pub mod charger;
pub mod connection_event;
pub mod connector;
pub mod message_log;
pub mod rfid_card;
pub mod session;
pub mod system_config;
pub mod user;
