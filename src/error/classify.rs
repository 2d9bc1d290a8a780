//! Mapping of backend error payloads onto [`ErrorKind`].

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::{ErrorKind, WireMessage};

/// Expected failure envelope:
/// `{ "error": { "message": "...", "data": { "req_uuid": "...", "detail": ... } } }`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    data: ErrorData,
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    req_uuid: String,
    #[serde(default)]
    detail: Option<Value>,
}

/// Classify a decoded error payload.
///
/// Total: payloads that do not match the envelope, or carry an unrecognised
/// message, map to [`ErrorKind::UnknownError`]. `status` does not affect the
/// kind; see [`is_terminal`] for the status-dependent part.
pub fn classify(payload: &Value, status: u16) -> ErrorKind {
    let envelope = match ErrorEnvelope::deserialize(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::debug!(status, error = %err, "Error payload does not match envelope");
            return ErrorKind::UnknownError;
        }
    };
    let ErrorBody { message, data } = envelope.error;
    tracing::debug!(status, req_uuid = %data.req_uuid, message = %message, "Backend rejected request");
    let Ok(wire) = WireMessage::from_str(&message) else {
        tracing::debug!(status, message = %message, "Unrecognised error message");
        return ErrorKind::UnknownError;
    };
    match wire {
        WireMessage::UsernameNotFound => ErrorKind::UsernameNotFound,
        WireMessage::IncorrectPassword => ErrorKind::IncorrectPassword,
        WireMessage::AccessTokenExpired => ErrorKind::AccessTokenExpired,
        WireMessage::SessionExpired => ErrorKind::SessionExpired,
        WireMessage::InvalidRequest => ErrorKind::InvalidRequest,
        WireMessage::NoAuth => ErrorKind::NoAuth,
        WireMessage::ServiceError => ErrorKind::ServiceError,
        WireMessage::PermissionDenied => ErrorKind::PermissionDenied,
        WireMessage::DuplicateRecord => ErrorKind::DuplicateRecord {
            detail: data.detail.and_then(render_detail),
        },
    }
}

/// Classify a raw response body. Text that is not JSON is `UnknownError`.
pub fn classify_body(body: &str, status: u16) -> ErrorKind {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => classify(&payload, status),
        Err(err) => {
            tracing::debug!(status, error = %err, "Error body is not JSON");
            ErrorKind::UnknownError
        }
    }
}

/// Whether `kind` arriving with `status` means the server has revoked the session.
pub fn is_terminal(kind: &ErrorKind, status: u16) -> bool {
    matches!(
        (kind, status),
        (ErrorKind::SessionExpired, 401) | (ErrorKind::NoAuth, 403)
    )
}

fn render_detail(detail: Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
