pub mod charge_point;
pub mod liveness;

pub use charge_point::ChargePointService;
pub use liveness::LivenessMonitor;
