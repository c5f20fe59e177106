//! Axum request handlers for all service endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use common::protocol::{ApiResponse, HealthResponse, ENCRYPTED_FIELD};
use common::ServiceError;
use serde_json::Value;
use tracing::warn;

use super::state::AppState;

/// `POST /echo` — reply with the (decrypted) request body.
///
/// Sits behind both envelope layers: the body arrives decrypted and the reply
/// leaves encrypted. A body that still carries an `encrypted` member means the
/// decrypt layer could not open it.
pub async fn echo(body: Result<Json<Value>, JsonRejection>) -> Result<ApiResponse, ServiceError> {
    let Json(body) = body.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;

    if body.get(ENCRYPTED_FIELD).is_some_and(Value::is_string) {
        warn!("request body reached handler still encrypted");
        return Err(ServiceError::BadRequest(
            "request body could not be decrypted".into(),
        ));
    }

    Ok(ApiResponse::success("ok", body))
}

/// `GET /health` — liveness check. Never encrypted.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        mode: state.mode.as_str().into(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> ServiceError {
    ServiceError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::json;

    #[tokio::test]
    async fn echo_returns_body_as_data() {
        let resp = echo(Ok(Json(json!({"a": 1})))).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.data, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn echo_flags_still_encrypted_body() {
        let err = echo(Ok(Json(json!({"encrypted": "00:11"})))).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        let reply = ApiResponse::from(err);
        assert!(!reply.success);
        assert_eq!(reply.code, 400);
        assert!(reply.message.contains("could not be decrypted"));
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let resp = not_found().await.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
