//! Remote command request DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RemoteStartRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[validate(length(min = 1, max = 20))]
    pub id_tag: String,
    pub connector_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RemoteStopRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UnlockConnectorRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    pub connector_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GetConfigurationRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetConfigurationRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[validate(length(min = 1, max = 50))]
    pub key: String,
    #[validate(length(max = 500))]
    pub value: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeAvailabilityRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    pub connector_id: i32,
    /// Operative or Inoperative
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    /// Hard or Soft
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TriggerMessageRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    pub requested_message: String,
    pub connector_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClearCacheRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocalListEntryDto {
    pub id_tag: String,
    #[schema(value_type = Object)]
    pub id_tag_info: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendLocalListRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[validate(range(min = 1))]
    pub list_version: i32,
    /// Differential or Full
    pub update_type: String,
    #[serde(default)]
    pub local_authorization_list: Vec<LocalListEntryDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GetLocalListVersionRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GetDiagnosticsRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetChargingProfileRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    pub connector_id: i32,
    #[schema(value_type = Object)]
    pub charging_profile: Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClearChargingProfileRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    pub connector_id: Option<i32>,
    pub charging_profile_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFirmwareRequest {
    #[validate(length(min = 1))]
    pub charger_id: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub retrieve_date: DateTime<Utc>,
    pub retries: Option<i32>,
    pub retry_interval: Option<i32>,
}
