//! Use-case orchestration: protocol handlers, outbound commands, live
//! connection registry, session projection, liveness and the back-office
//! bridge.

pub mod bridge;
pub mod commands;
pub mod events;
pub mod handlers;
pub mod projector;
pub mod registry;
pub mod services;

pub use commands::retry::{RetryEngine, SharedRetryEngine};
pub use events::{create_event_bus, Event, EventBus, EventMessage, SharedEventBus};
pub use handlers::OcppHandler;
pub use projector::{SessionProjector, SharedSessionProjector};
pub use registry::{ConnectionRegistry, SharedConnectionRegistry};
pub use services::charge_point::ChargePointService;
pub use services::liveness::LivenessMonitor;
