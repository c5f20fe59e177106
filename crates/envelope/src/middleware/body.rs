//! Pure body transforms used by the layers: no I/O, no HTTP types beyond headers.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::Bytes;
use common::protocol::{EncryptedBody, ENCRYPTED_FIELD};
use serde::de::IgnoredAny;
use serde_json::Value;
use thiserror::Error;

use crate::codec::{CodecError, Open, Seal};

/// Why a body could not be transformed. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not UTF-8 text: {0}")]
    NotText(#[from] std::str::Utf8Error),
}

/// Outcome of looking at an inbound body.
#[derive(Debug, PartialEq, Eq)]
pub enum Opened {
    /// Not an `{"encrypted": "..."}` body; forward as-is.
    Untouched,
    /// Decrypted JSON text that replaces the body.
    Decrypted(Bytes),
}

/// `true` when the media type is `application/json`, ignoring parameters.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Decrypt an `{"encrypted": "<envelope>"}` body into the JSON it carries.
///
/// Bodies that do not parse as JSON, are not objects, or lack a non-empty
/// string `encrypted` member are left alone.
///
/// # Errors
///
/// Returns [`TransformError`] if the envelope does not open or its plaintext
/// is not JSON.
pub fn open_body(opener: &dyn Open, body: &[u8]) -> Result<Opened, TransformError> {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return Ok(Opened::Untouched);
    };
    let Some(Value::String(envelope)) = map.get(ENCRYPTED_FIELD) else {
        return Ok(Opened::Untouched);
    };
    if envelope.is_empty() {
        return Ok(Opened::Untouched);
    }

    let plaintext = opener.open(envelope)?;
    serde_json::from_str::<IgnoredAny>(&plaintext)?;
    Ok(Opened::Decrypted(Bytes::from(plaintext)))
}

/// Encrypt an outbound body into `{"encrypted": "<envelope>"}`.
///
/// A body declared as JSON (`json == true`) is encrypted verbatim; any other
/// body is first serialised as a JSON string of its text, so the receiver can
/// always parse the plaintext as JSON.
///
/// # Errors
///
/// Returns [`TransformError`] if the body is not UTF-8 or sealing fails.
pub fn seal_body(sealer: &dyn Seal, json: bool, body: &[u8]) -> Result<Bytes, TransformError> {
    let text = std::str::from_utf8(body)?;
    let plaintext = if json {
        text.to_owned()
    } else {
        serde_json::to_string(text)?
    };
    let envelope = sealer.seal(&plaintext)?;
    Ok(Bytes::from(serde_json::to_vec(&EncryptedBody::new(envelope))?))
}
