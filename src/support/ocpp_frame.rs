//! OCPP-J message framing
//!
//! Implements the OCPP-J (JSON over WebSocket) transport framing. The frame
//! shapes are identical for every OCPP version carried over this transport:
//!
//! - **Call**       `[2, "<messageId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<messageId>", {<payload>}]`
//! - **CallError**  `[4, "<messageId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`

use serde_json::Value;
use thiserror::Error;

// ── Message-type constants ─────────────────────────────────────

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

/// Largest frame a charge point may send (matches the listener's max_size).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

// ── Standard OCPP 1.6 error codes ──────────────────────────────

pub const ERR_FORMAT_VIOLATION: &str = "FormatViolation";
pub const ERR_NOT_IMPLEMENTED: &str = "NotImplemented";
pub const ERR_PROPERTY_CONSTRAINT_VIOLATION: &str = "PropertyConstraintViolation";
pub const ERR_INTERNAL: &str = "InternalError";

// ── OcppFrame ──────────────────────────────────────────────────

/// A parsed OCPP-J frame (version-agnostic transport envelope).
#[derive(Debug, Clone)]
pub enum OcppFrame {
    /// `[2, messageId, action, payload]`
    Call {
        message_id: String,
        action: String,
        payload: Value,
    },
    /// `[3, messageId, payload]`
    CallResult { message_id: String, payload: Value },
    /// `[4, messageId, errorCode, errorDescription, errorDetails]`
    CallError {
        message_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

impl OcppFrame {
    // ── Parsing ────────────────────────────────────────────

    /// Parse a raw JSON text frame.
    pub fn parse(text: &str) -> Result<Self, OcppFrameError> {
        if text.len() > MAX_FRAME_SIZE {
            return Err(OcppFrameError::FrameTooLarge(text.len()));
        }

        let arr: Vec<Value> =
            serde_json::from_str(text).map_err(|e| OcppFrameError::InvalidJson(e.to_string()))?;

        if arr.is_empty() {
            return Err(OcppFrameError::EmptyArray);
        }

        let msg_type = arr[0].as_u64().ok_or(OcppFrameError::InvalidMessageType)?;

        match msg_type {
            MSG_TYPE_CALL => Self::parse_call(&arr),
            MSG_TYPE_CALL_RESULT => Self::parse_call_result(&arr),
            MSG_TYPE_CALL_ERROR => Self::parse_call_error(&arr),
            _ => Err(OcppFrameError::UnknownMessageType(msg_type)),
        }
    }

    /// Best-effort extraction of a message id from an unparseable frame, so a
    /// CALLERROR can still echo it back.
    pub fn salvage_message_id(text: &str) -> Option<String> {
        let arr: Vec<Value> = serde_json::from_str(text).ok()?;
        arr.get(1)?.as_str().map(String::from)
    }

    fn parse_call(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 4 {
            return Err(OcppFrameError::MissingFields {
                expected: 4,
                got: arr.len(),
            });
        }

        let message_id = arr[1]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("messageId must be a string"))?
            .to_string();
        let action = arr[2]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("action must be a string"))?
            .to_string();
        let payload = arr[3].clone();

        Ok(Self::Call {
            message_id,
            action,
            payload,
        })
    }

    fn parse_call_result(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 2 {
            return Err(OcppFrameError::MissingFields {
                expected: 3,
                got: arr.len(),
            });
        }

        let message_id = arr[1]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("messageId must be a string"))?
            .to_string();
        // Some stations send [3, "id"] or a null payload; tolerate both.
        let payload = match arr.get(2) {
            Some(Value::Null) | None => Value::Object(Default::default()),
            Some(v) => v.clone(),
        };

        Ok(Self::CallResult { message_id, payload })
    }

    fn parse_call_error(arr: &[Value]) -> Result<Self, OcppFrameError> {
        if arr.len() < 2 {
            return Err(OcppFrameError::MissingFields {
                expected: 5,
                got: arr.len(),
            });
        }

        let message_id = arr[1]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("messageId must be a string"))?
            .to_string();
        // Truncated CALLERRORs ([4,"id"] or [4,"id","Code"]) occur in the
        // field; fill the gaps rather than reject.
        let error_code = arr
            .get(2)
            .and_then(|v| v.as_str())
            .unwrap_or(ERR_INTERNAL)
            .to_string();
        let error_description = arr
            .get(3)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let error_details = arr
            .get(4)
            .cloned()
            .unwrap_or(Value::Object(Default::default()));

        Ok(Self::CallError {
            message_id,
            error_code,
            error_description,
            error_details,
        })
    }

    // ── Serialization ──────────────────────────────────────

    /// Serialize this frame to a JSON string.
    pub fn serialize(&self) -> String {
        // serde_json::to_string on a Value never fails
        serde_json::to_string(&self.to_value()).unwrap()
    }

    /// The frame as a raw JSON array (used by the observer envelope).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Call {
                message_id,
                action,
                payload,
            } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL.into()),
                Value::String(message_id.clone()),
                Value::String(action.clone()),
                payload.clone(),
            ]),

            Self::CallResult { message_id, payload } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL_RESULT.into()),
                Value::String(message_id.clone()),
                payload.clone(),
            ]),

            Self::CallError {
                message_id,
                error_code,
                error_description,
                error_details,
            } => Value::Array(vec![
                Value::Number(MSG_TYPE_CALL_ERROR.into()),
                Value::String(message_id.clone()),
                Value::String(error_code.clone()),
                Value::String(error_description.clone()),
                error_details.clone(),
            ]),
        }
    }

    // ── Constructors / helpers ─────────────────────────────

    pub fn call(
        message_id: impl Into<String>,
        action: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::Call {
            message_id: message_id.into(),
            action: action.into(),
            payload,
        }
    }

    pub fn call_result(message_id: impl Into<String>, payload: Value) -> Self {
        Self::CallResult {
            message_id: message_id.into(),
            payload,
        }
    }

    /// Create a `CallError` response for a given message id.
    pub fn error_response(
        message_id: impl Into<String>,
        error_code: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        Self::CallError {
            message_id: message_id.into(),
            error_code: error_code.into(),
            error_description: error_description.into(),
            error_details: Value::Object(Default::default()),
        }
    }

    /// Get the message id.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Call { message_id, .. }
            | Self::CallResult { message_id, .. }
            | Self::CallError { message_id, .. } => message_id,
        }
    }

    /// The action name, for `Call` frames.
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Call { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }

    pub fn is_call_result(&self) -> bool {
        matches!(self, Self::CallResult { .. })
    }

    pub fn is_call_error(&self) -> bool {
        matches!(self, Self::CallError { .. })
    }
}

// ── Errors ─────────────────────────────────────────────────────

/// Errors that can occur when parsing an OCPP-J frame.
#[derive(Debug, Error)]
pub enum OcppFrameError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Empty OCPP message array")]
    EmptyArray,
    #[error("Message type is not a number")]
    InvalidMessageType,
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u64),
    #[error("Expected at least {expected} fields, got {got}")]
    MissingFields { expected: usize, got: usize },
    #[error("Field type mismatch: {0}")]
    FieldTypeMismatch(&'static str),
    #[error("Frame exceeds maximum size: {0} bytes")]
    FrameTooLarge(usize),
}

impl OcppFrameError {
    /// Whether the offending frame still carried a usable message id, so the
    /// error can be reported back as a CALLERROR rather than dropped.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownMessageType(_) | Self::MissingFields { .. } | Self::FieldTypeMismatch(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_call() {
        let text = r#"[2,"b1","BootNotification",{"chargePointVendor":"Vendor","chargePointModel":"Model"}]"#;
        let frame = OcppFrame::parse(text).unwrap();
        match frame {
            OcppFrame::Call {
                message_id,
                action,
                payload,
            } => {
                assert_eq!(message_id, "b1");
                assert_eq!(action, "BootNotification");
                assert_eq!(payload["chargePointVendor"], "Vendor");
            }
            _ => panic!("Expected Call frame"),
        }
    }

    #[test]
    fn parse_call_result() {
        let text = r#"[3,"b1",{"status":"Accepted","currentTime":"2024-01-01T00:00:00Z","interval":60}]"#;
        let frame = OcppFrame::parse(text).unwrap();
        match frame {
            OcppFrame::CallResult { message_id, payload } => {
                assert_eq!(message_id, "b1");
                assert_eq!(payload["status"], "Accepted");
            }
            _ => panic!("Expected CallResult frame"),
        }
    }

    #[test]
    fn parse_call_result_null_payload() {
        let frame = OcppFrame::parse(r#"[3,"x1",null]"#).unwrap();
        match frame {
            OcppFrame::CallResult { payload, .. } => assert!(payload.is_object()),
            _ => panic!("Expected CallResult frame"),
        }
    }

    #[test]
    fn parse_truncated_call_error() {
        let frame = OcppFrame::parse(r#"[4,"e1"]"#).unwrap();
        match frame {
            OcppFrame::CallError { error_code, .. } => assert_eq!(error_code, ERR_INTERNAL),
            _ => panic!("Expected CallError frame"),
        }
    }

    #[test]
    fn parse_call_error() {
        let text = r#"[4,"e2","NotImplemented","Action not supported",{}]"#;
        let frame = OcppFrame::parse(text).unwrap();
        match frame {
            OcppFrame::CallError {
                message_id,
                error_code,
                error_description,
                ..
            } => {
                assert_eq!(message_id, "e2");
                assert_eq!(error_code, "NotImplemented");
                assert_eq!(error_description, "Action not supported");
            }
            _ => panic!("Expected CallError frame"),
        }
    }

    #[test]
    fn reject_non_array() {
        assert!(OcppFrame::parse(r#"{"not":"an array"}"#).is_err());
    }

    #[test]
    fn reject_short_call() {
        let err = OcppFrame::parse(r#"[2,"id","Heartbeat"]"#).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn reject_unknown_type() {
        let err = OcppFrame::parse(r#"[9,"id",{}]"#).unwrap_err();
        assert!(matches!(err, OcppFrameError::UnknownMessageType(9)));
    }

    #[test]
    fn reject_oversized_frame() {
        let huge = format!(r#"[2,"id","DataTransfer",{{"data":"{}"}}]"#, "x".repeat(MAX_FRAME_SIZE));
        assert!(matches!(
            OcppFrame::parse(&huge),
            Err(OcppFrameError::FrameTooLarge(_))
        ));
    }

    #[test]
    fn salvage_id_from_malformed_frame() {
        assert_eq!(
            OcppFrame::salvage_message_id(r#"[2,"m7",42,{}]"#).as_deref(),
            Some("m7")
        );
        assert_eq!(OcppFrame::salvage_message_id("not json"), None);
    }

    #[test]
    fn roundtrip_preserves_arity_and_scalars() {
        for text in [
            r#"[2,"id1","Heartbeat",{}]"#,
            r#"[3,"id2",{"currentTime":"2024-01-01T00:00:00Z"}]"#,
            r#"[4,"id3","GenericError","boom",{"k":1}]"#,
        ] {
            let parsed = OcppFrame::parse(text).unwrap();
            let original: Value = serde_json::from_str(text).unwrap();
            let reserialized: Value = serde_json::from_str(&parsed.serialize()).unwrap();
            assert_eq!(original, reserialized);
        }
    }

    #[test]
    fn error_response_echoes_id() {
        let frame = OcppFrame::error_response("m1", ERR_FORMAT_VIOLATION, "bad frame");
        assert!(frame.is_call_error());
        assert_eq!(frame.message_id(), "m1");
    }
}
