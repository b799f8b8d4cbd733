pub mod auth;
pub mod chargers;
pub mod commands;
pub mod connectors;
pub mod health;
pub mod logs;
pub mod monitoring;
pub mod rfid_cards;
pub mod users;
