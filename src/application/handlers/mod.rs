//! OCPP 1.6 inbound message handling
//!
//! One handler module per CP→CS action. `OcppHandler::handle` parses the
//! frame, dispatches CALLs, correlates CALLRESULT/CALLERROR with the retry
//! engine and appends the message log entry for every inbound call.

mod handle_authorize;
mod handle_boot_notification;
mod handle_data_transfer;
mod handle_diagnostics_status;
mod handle_firmware_status;
mod handle_get_composite_schedule;
mod handle_heartbeat;
mod handle_meter_values;
mod handle_remote_echo;
mod handle_reservations;
mod handle_start_transaction;
mod handle_status_notification;
mod handle_stop_transaction;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::application::commands::retry::SharedRetryEngine;
use crate::application::events::SharedEventBus;
use crate::application::services::ChargePointService;
use crate::domain::message_log::{LogDirection, LogStatus, MessageLog};
use crate::support::errors::DomainResult;
use crate::support::ocpp_frame::{
    OcppFrame, ERR_FORMAT_VIOLATION, ERR_INTERNAL, ERR_NOT_IMPLEMENTED,
};

/// Per-connection handler for one charge point.
pub struct OcppHandler {
    pub charger_id: String,
    pub connection_id: String,
    pub service: Arc<ChargePointService>,
    pub engine: SharedRetryEngine,
    pub event_bus: SharedEventBus,
}

impl OcppHandler {
    pub fn new(
        charger_id: impl Into<String>,
        connection_id: impl Into<String>,
        service: Arc<ChargePointService>,
        engine: SharedRetryEngine,
        event_bus: SharedEventBus,
    ) -> Self {
        Self {
            charger_id: charger_id.into(),
            connection_id: connection_id.into(),
            service,
            engine,
            event_bus,
        }
    }

    /// Handle one inbound text frame. Returns the frame to write back, if
    /// any (CALLs produce a response; CALLRESULT/CALLERROR do not).
    pub async fn handle(&self, text: &str) -> Option<OcppFrame> {
        let frame = match OcppFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                // Echo a FormatViolation when the message id is salvageable,
                // otherwise log and keep receiving.
                warn!(
                    charger_id = self.charger_id.as_str(),
                    error = %e,
                    "Unparseable frame"
                );
                return OcppFrame::salvage_message_id(text).map(|id| {
                    OcppFrame::error_response(id, ERR_FORMAT_VIOLATION, e.to_string())
                });
            }
        };

        match frame {
            OcppFrame::Call {
                message_id,
                action,
                payload,
            } => Some(self.handle_call(message_id, action, payload).await),
            OcppFrame::CallResult {
                message_id,
                payload,
            } => {
                self.engine
                    .handle_response(&self.charger_id, &message_id, payload.clone())
                    .await;
                self.log(
                    "CallResult",
                    Some(message_id),
                    LogStatus::Success,
                    None,
                    None,
                    Some(payload.to_string()),
                )
                .await;
                None
            }
            OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                error_details,
            } => {
                self.engine
                    .handle_error(&self.charger_id, &message_id, &error_code, &error_description)
                    .await;
                let detail = serde_json::json!({
                    "errorCode": error_code,
                    "errorDescription": error_description,
                    "errorDetails": error_details,
                });
                self.log(
                    "CallError",
                    Some(message_id),
                    LogStatus::Error,
                    None,
                    None,
                    Some(detail.to_string()),
                )
                .await;
                None
            }
        }
    }

    async fn handle_call(&self, message_id: String, action: String, payload: Value) -> OcppFrame {
        let started = Instant::now();
        info!(
            charger_id = self.charger_id.as_str(),
            action = action.as_str(),
            message_id = message_id.as_str(),
            "Handling call"
        );

        let outcome = self.dispatch(&action, &payload).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(Some(result)) => OcppFrame::call_result(&message_id, result),
            Ok(None) => OcppFrame::error_response(
                &message_id,
                ERR_NOT_IMPLEMENTED,
                format!("Action {action} not supported"),
            ),
            Err(e) => {
                error!(
                    charger_id = self.charger_id.as_str(),
                    action = action.as_str(),
                    error = %e,
                    "Handler failed"
                );
                OcppFrame::error_response(&message_id, ERR_INTERNAL, e.to_string())
            }
        };

        let status = if response.is_call_error() {
            LogStatus::Error
        } else {
            LogStatus::Success
        };
        self.log(
            &action,
            Some(message_id),
            status,
            Some(elapsed_ms),
            Some(payload.to_string()),
            Some(response.serialize()),
        )
        .await;

        response
    }

    /// Route a CALL to its action handler. `Ok(None)` means the action is
    /// not implemented.
    async fn dispatch(&self, action: &str, payload: &Value) -> DomainResult<Option<Value>> {
        let result = match action {
            "Authorize" => handle_authorize::handle(self, payload).await?,
            "BootNotification" => handle_boot_notification::handle(self, payload).await?,
            "CancelReservation" => handle_reservations::handle_cancel(self, payload).await?,
            "DataTransfer" => handle_data_transfer::handle(self, payload).await?,
            "DiagnosticsStatusNotification" => {
                handle_diagnostics_status::handle(self, payload).await?
            }
            "FirmwareStatusNotification" => handle_firmware_status::handle(self, payload).await?,
            "GetCompositeSchedule" => handle_get_composite_schedule::handle(self, payload).await?,
            "Heartbeat" => handle_heartbeat::handle(self, payload).await?,
            "MeterValues" => handle_meter_values::handle(self, payload).await?,
            "RemoteStartTransaction" => handle_remote_echo::handle_remote_start(self, payload).await?,
            "RemoteStopTransaction" => handle_remote_echo::handle_remote_stop(self, payload).await?,
            "ReserveNow" => handle_reservations::handle_reserve(self, payload).await?,
            "StartTransaction" => handle_start_transaction::handle(self, payload).await?,
            "StatusNotification" => handle_status_notification::handle(self, payload).await?,
            "StopTransaction" => handle_stop_transaction::handle(self, payload).await?,
            "TriggerMessage" => handle_remote_echo::handle_trigger(self, payload).await?,
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    async fn log(
        &self,
        action: &str,
        message_id: Option<String>,
        status: LogStatus,
        processing_time_ms: Option<f64>,
        request: Option<String>,
        response: Option<String>,
    ) {
        let mut log = MessageLog::new(&self.charger_id, LogDirection::In, action, message_id, status);
        if let Some(ms) = processing_time_ms {
            log = log.with_processing_time(ms);
        }
        if let Some(req) = request {
            log = log.with_request(req);
        }
        if let Some(resp) = response {
            log = log.with_response(resp);
        }
        self.service.repos().message_logs().append(log).await;
    }
}

// ── Payload field helpers (tolerant access, null-safe) ─────────

pub(crate) fn field_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(String::from)
}

pub(crate) fn field_i32(payload: &Value, key: &str) -> Option<i32> {
    let value = payload.get(key)?;
    if let Some(n) = value.as_i64() {
        return Some(n as i32);
    }
    // Some stations send numeric fields as strings.
    value.as_str().and_then(|s| s.trim().parse().ok())
}

pub(crate) fn field_f64(payload: &Value, key: &str) -> Option<f64> {
    let value = payload.get(key)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::application::events::{create_event_bus, EventSubscriber};
    use crate::application::registry::ConnectionRegistry;
    use crate::application::RetryEngine;
    use crate::infrastructure::storage::MemoryRepositoryProvider;

    pub struct HandlerFixture {
        pub handler: OcppHandler,
        pub repos: Arc<MemoryRepositoryProvider>,
        pub subscriber: EventSubscriber,
    }

    pub fn fixture(charger_id: &str) -> HandlerFixture {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
        let event_bus = create_event_bus();
        let subscriber = event_bus.subscribe();
        let engine = Arc::new(RetryEngine::new(
            registry,
            repos.clone(),
            event_bus.clone(),
        ));
        let service = Arc::new(ChargePointService::new(repos.clone()));
        let handler = OcppHandler::new(charger_id, "conn-test", service, engine, event_bus);
        HandlerFixture {
            handler,
            repos,
            subscriber,
        }
    }

    /// Run a CALL through the full handler and return the response frame.
    pub async fn call(handler: &OcppHandler, action: &str, payload: Value) -> OcppFrame {
        let frame = OcppFrame::call("test-1", action, payload);
        handler
            .handle(&frame.serialize())
            .await
            .expect("CALL must produce a response")
    }

    pub fn result_payload(frame: &OcppFrame) -> &Value {
        match frame {
            OcppFrame::CallResult { payload, .. } => payload,
            other => panic!("expected CallResult, got {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::repositories::RepositoryProvider;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_action_returns_not_implemented() {
        let f = fixture("CP001");
        let response = call(&f.handler, "MadeUpAction", json!({})).await;
        match response {
            OcppFrame::CallError { error_code, .. } => {
                assert_eq!(error_code, ERR_NOT_IMPLEMENTED)
            }
            other => panic!("expected CallError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_frame_with_id_gets_format_violation() {
        let f = fixture("CP001");
        // action is a number, so parsing fails but the id is salvageable
        let response = f.handler.handle(r#"[2,"m9",42,{}]"#).await.unwrap();
        match response {
            OcppFrame::CallError {
                message_id,
                error_code,
                ..
            } => {
                assert_eq!(message_id, "m9");
                assert_eq!(error_code, ERR_FORMAT_VIOLATION);
            }
            other => panic!("expected CallError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_frame_is_dropped() {
        let f = fixture("CP001");
        assert!(f.handler.handle("not json at all").await.is_none());
    }

    #[tokio::test]
    async fn inbound_calls_are_logged() {
        let f = fixture("CP001");
        call(&f.handler, "Heartbeat", json!({})).await;
        let logs = f.repos.message_logs().list(Some("CP001"), 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "Heartbeat");
        assert!(logs[0].processing_time_ms.is_some());
    }

    #[test]
    fn tolerant_field_access() {
        let payload = json!({
            "connectorId": "2",
            "meterStart": 100,
            "transactionId": null,
        });
        assert_eq!(field_i32(&payload, "connectorId"), Some(2));
        assert_eq!(field_f64(&payload, "meterStart"), Some(100.0));
        assert_eq!(field_i32(&payload, "transactionId"), None);
        assert_eq!(field_str(&payload, "missing"), None);
    }
}
