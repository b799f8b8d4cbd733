//! Shared response shapes and error mapping for the admin facade

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::support::errors::DomainError;

/// Accepted-command response: the `message_id` correlates with subsequent
/// message log entries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommandAccepted {
    /// Always "Accepted"
    pub status: String,
    pub message_id: String,
    pub message: String,
}

impl CommandAccepted {
    pub fn new(message_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "Accepted".to_string(),
            message_id: message_id.into(),
            message: message.into(),
        }
    }
}

/// Error surfaced to admin clients as `{status: "Rejected", detail}`.
#[derive(Debug)]
pub struct ApiError {
    pub code: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(code: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "Rejected",
            "detail": self.detail,
        });
        (self.code, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let code = match &e {
            DomainError::NotFound { .. } | DomainError::NoActiveSession(_) => {
                StatusCode::NOT_FOUND
            }
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::ChargerOffline(_) => StatusCode::BAD_REQUEST,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_codes() {
        let cases = [
            (
                DomainError::NoActiveSession("CP1".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::ChargerOffline("CP1".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Database("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).code, expected);
        }
    }
}
