//! Delivery mechanisms: WebSocket endpoints and the HTTP admin facade.

pub mod http;
pub mod ws;
