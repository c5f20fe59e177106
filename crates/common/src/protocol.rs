//! Request and response bodies exchanged with clients.
//!
//! An encrypted body on the wire is always a JSON object with a single
//! `encrypted` member holding an envelope string. Plain responses use the
//! [`ApiResponse`] shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Encrypted body
// ---------------------------------------------------------------------------

/// Name of the JSON member that carries an envelope.
pub const ENCRYPTED_FIELD: &str = "encrypted";

/// Wire shape of an encrypted request or response body: `{"encrypted": "<envelope>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBody {
    /// Envelope string produced by the symmetric or asymmetric codec.
    pub encrypted: String,
}

impl EncryptedBody {
    /// Wrap an envelope string.
    pub fn new(envelope: impl Into<String>) -> Self {
        Self {
            encrypted: envelope.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// API response
// ---------------------------------------------------------------------------

/// Message sent in place of any internal error detail.
pub const CRASH_MESSAGE: &str =
    "An internal server error occurred while processing your request.";

/// Standard response body for every handler.
///
/// `code` mirrors the HTTP status and is also used as the status when the
/// value is turned into a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ApiResponse {
    /// Success response with status 200. Empty `data` is omitted.
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self::success_with_code(message, data, 200)
    }

    /// Success response with an explicit status code.
    pub fn success_with_code(message: impl Into<String>, data: Value, code: u16) -> Self {
        Self {
            success: true,
            code,
            message: message.into(),
            data: non_empty(data),
            error: None,
        }
    }

    /// Failure response with status 422. Empty `error` is omitted.
    pub fn failure(message: impl Into<String>, error: Value) -> Self {
        Self::failure_with_code(message, error, 422)
    }

    /// Failure response with an explicit status code.
    pub fn failure_with_code(message: impl Into<String>, error: Value, code: u16) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
            error: non_empty(error),
        }
    }

    /// Internal failure. The cause is logged and never sent to the client.
    pub fn crash(cause: &dyn std::fmt::Display) -> Self {
        error!(error = %cause, "request crashed");
        Self {
            success: false,
            code: 500,
            message: CRASH_MESSAGE.into(),
            data: None,
            error: None,
        }
    }
}

/// `null`, `{}`, `[]` and `""` count as "nothing to send".
fn non_empty(value: Value) -> Option<Value> {
    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    (!empty).then_some(value)
}

impl From<ServiceError> for ApiResponse {
    fn from(err: ServiceError) -> Self {
        Self::failure_with_code(err.to_string(), Value::Null, err.http_status())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        ApiResponse::from(self).into_response()
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` once the service is serving.
    pub status: String,
    /// Envelope variant in use: `"symmetric"` or `"asymmetric"`.
    pub mode: String,
}
