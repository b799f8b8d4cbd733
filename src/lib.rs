//! # OCPP CMS
//!
//! OCPP 1.6J Central Management System: terminates charge-point WebSocket
//! connections, dispatches the 1.6 action set, tracks sessions and charger
//! state, fans protocol traffic out to observers, and bridges domain events
//! to an external back-office.
//!
//! ## Layout
//!
//! - **support**: cross-cutting utilities (errors, OCPP-J framing, retry,
//!   shutdown)
//! - **domain**: entities and repository traits
//! - **infrastructure**: SeaORM persistence, in-memory store, crypto
//! - **application**: handlers, outbound commands + retry engine, connection
//!   registry, session projector, liveness, event bridge
//! - **interfaces**: WebSocket endpoints and the HTTP admin facade
//! - **config**: env-driven configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;

// Re-export commonly used types at crate root
pub use application::{
    create_event_bus, ChargePointService, ConnectionRegistry, EventBus, LivenessMonitor,
    OcppHandler, RetryEngine, SessionProjector,
};
pub use config::AppConfig;
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use interfaces::http::create_api_router;
pub use interfaces::ws::OcppServer;
pub use support::ocpp_frame::OcppFrame;
