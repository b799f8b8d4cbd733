//! WebSocket endpoints
//!
//! One listener serves three paths: `/ocpp/{charger_id}` for charge points,
//! `/master` for protocol observers and `/dashboard` for the authenticated
//! live view.

mod charger;
mod dashboard;
mod master;
mod negotiator;
mod ocpp_server;
mod tls;

pub use negotiator::{OcppVersion, ProtocolNegotiator};
pub use ocpp_server::{OcppServer, WsServerConfig};
pub use tls::load_tls_config;
