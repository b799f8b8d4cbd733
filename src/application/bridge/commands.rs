//! Back-office command dispatch
//!
//! Commands popped from `<exchange>:commands` are routed through the same
//! builders and retry engine as the admin facade.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::application::commands::retry::SharedRetryEngine;
use crate::application::commands::{
    ChangeConfiguration, RemoteStartTransaction, RemoteStopTransaction, Reset, ResetType,
    UnlockConnector,
};
use crate::application::services::ChargePointService;
use crate::support::errors::DomainResult;

/// `{command, charger_id, payload, request_id?, require_response?}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub charger_id: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub require_response: bool,
}

/// Written to `<exchange>:responses:<request_id>`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandResult {
    /// "accepted" or "error"
    pub status: String,
    pub message: String,
}

impl CommandResult {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            status: "accepted".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

pub async fn dispatch(
    engine: &SharedRetryEngine,
    service: &Arc<ChargePointService>,
    request: CommandRequest,
) -> CommandResult {
    info!(
        charger_id = request.charger_id.as_str(),
        command = request.command.as_str(),
        "Back-office command received"
    );

    let outcome = match request.command.as_str() {
        "RemoteStartTransaction" => remote_start(engine, &request).await,
        "RemoteStopTransaction" => remote_stop(engine, service, &request).await,
        "UnlockConnector" => unlock_connector(engine, &request).await,
        "Reset" => reset(engine, &request).await,
        "ChangeConfiguration" => change_configuration(engine, &request).await,
        other => {
            return CommandResult::error(format!("Unknown command: {other}"));
        }
    };

    match outcome {
        Ok(message_id) => {
            CommandResult::accepted(format!("{} dispatched ({message_id})", request.command))
        }
        Err(e) => CommandResult::error(e.to_string()),
    }
}

async fn remote_start(
    engine: &SharedRetryEngine,
    request: &CommandRequest,
) -> DomainResult<String> {
    let call = RemoteStartTransaction {
        id_tag: request.payload["idTag"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        connector_id: request.payload["connectorId"].as_i64().map(|n| n as i32),
    }
    .build()?;
    engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await
}

async fn remote_stop(
    engine: &SharedRetryEngine,
    service: &Arc<ChargePointService>,
    request: &CommandRequest,
) -> DomainResult<String> {
    // The back-office may name the transaction; otherwise the most recent
    // Active session is stopped.
    let transaction_id = match request.payload["transactionId"].as_i64() {
        Some(id) => id as i32,
        None => service
            .latest_active_session(&request.charger_id)
            .await?
            .and_then(|s| s.transaction_id)
            .ok_or_else(|| {
                crate::support::errors::DomainError::NoActiveSession(request.charger_id.clone())
            })?,
    };
    let call = RemoteStopTransaction { transaction_id }.build()?;
    engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await
}

async fn unlock_connector(
    engine: &SharedRetryEngine,
    request: &CommandRequest,
) -> DomainResult<String> {
    let call = UnlockConnector {
        connector_id: request.payload["connectorId"].as_i64().unwrap_or(0) as i32,
    }
    .build()?;
    engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await
}

async fn reset(engine: &SharedRetryEngine, request: &CommandRequest) -> DomainResult<String> {
    let kind = request.payload["type"]
        .as_str()
        .and_then(ResetType::parse)
        .unwrap_or(ResetType::Soft);
    let call = Reset { kind }.build()?;
    engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await
}

async fn change_configuration(
    engine: &SharedRetryEngine,
    request: &CommandRequest,
) -> DomainResult<String> {
    let call = ChangeConfiguration {
        key: request.payload["key"].as_str().unwrap_or("").to_string(),
        value: request.payload["value"].as_str().unwrap_or("").to_string(),
    }
    .build()?;
    engine
        .send_command(&request.charger_id, call.action, call.payload)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::registry::ConnectionRegistry;
    use crate::application::RetryEngine;
    use crate::infrastructure::storage::MemoryRepositoryProvider;
    use serde_json::json;

    fn fixture() -> (SharedRetryEngine, Arc<ChargePointService>, Arc<ConnectionRegistry>) {
        let repos = Arc::new(MemoryRepositoryProvider::new());
        let registry = Arc::new(ConnectionRegistry::new(repos.clone()));
        let engine = Arc::new(RetryEngine::new(
            registry.clone(),
            repos.clone(),
            create_event_bus(),
        ));
        let service = Arc::new(ChargePointService::new(repos));
        (engine, service, registry)
    }

    fn request(command: &str, payload: Value) -> CommandRequest {
        CommandRequest {
            command: command.to_string(),
            charger_id: "CP001".to_string(),
            payload,
            request_id: Some("req-1".to_string()),
            require_response: true,
        }
    }

    #[tokio::test]
    async fn unknown_command_is_an_error() {
        let (engine, service, _registry) = fixture();
        let result = dispatch(&engine, &service, request("SelfDestruct", json!({}))).await;
        assert_eq!(result.status, "error");
        assert!(result.message.contains("Unknown command"));
    }

    #[tokio::test]
    async fn reset_on_connected_charger_is_accepted() {
        let (engine, service, registry) = fixture();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.accept_cp("CP001", tx).unwrap();

        let result = dispatch(
            &engine,
            &service,
            request("Reset", json!({"type": "Hard"})),
        )
        .await;
        assert_eq!(result.status, "accepted");
    }

    #[tokio::test]
    async fn remote_stop_without_active_session_is_an_error() {
        let (engine, service, registry) = fixture();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.accept_cp("CP001", tx).unwrap();

        let result = dispatch(&engine, &service, request("RemoteStopTransaction", json!({}))).await;
        assert_eq!(result.status, "error");
    }

    #[tokio::test]
    async fn command_request_parses_wire_shape() {
        let raw = r#"{
            "command": "ChangeConfiguration",
            "charger_id": "CP700",
            "payload": {"key": "HeartbeatInterval", "value": "300"},
            "request_id": "abc",
            "require_response": true
        }"#;
        let request: CommandRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.command, "ChangeConfiguration");
        assert!(request.require_response);
    }
}
