//! Central System → Charge Point commands
//!
//! One builder module per OCPP 1.6 action, plus the retry engine that tracks
//! every outbound CALL until it is answered, times out, exhausts its retries
//! or loses its charger.

pub mod retry;

pub mod change_availability;
pub mod change_configuration;
pub mod clear_cache;
pub mod clear_charging_profile;
pub mod get_configuration;
pub mod get_diagnostics;
pub mod get_local_list_version;
pub mod remote_start;
pub mod remote_stop;
pub mod reset;
pub mod send_local_list;
pub mod set_charging_profile;
pub mod trigger_message;
pub mod unlock_connector;
pub mod update_firmware;

pub use change_availability::{AvailabilityType, ChangeAvailability};
pub use change_configuration::ChangeConfiguration;
pub use clear_cache::ClearCache;
pub use clear_charging_profile::ClearChargingProfile;
pub use get_configuration::GetConfiguration;
pub use get_diagnostics::GetDiagnostics;
pub use get_local_list_version::GetLocalListVersion;
pub use remote_start::RemoteStartTransaction;
pub use remote_stop::RemoteStopTransaction;
pub use reset::{Reset, ResetType};
pub use send_local_list::{LocalListEntry, SendLocalList, UpdateType};
pub use set_charging_profile::SetChargingProfile;
pub use trigger_message::{TriggerMessage, TriggerMessageKind};
pub use unlock_connector::UnlockConnector;
pub use update_firmware::UpdateFirmware;

use serde_json::Value;

/// An outbound CALL ready for dispatch: the OCPP action name and its
/// payload. Builders validate before producing one of these.
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub action: &'static str,
    pub payload: Value,
}
