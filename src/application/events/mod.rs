//! Event bus for in-process pub/sub
//!
//! Handlers publish protocol events here; the session projector and the
//! back-office bridge consume them on their own tasks, so the handler path
//! never blocks on either.

mod bus;
mod types;

pub use bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use types::*;
