//! Response body types.
//!
//! All parsing in the socket is permissive: a body that does not parse,
//! or parses with an unexpected `status`, is treated as a silent no-op
//! at the call site that detected it. Fields are therefore defaulted
//! rather than required wherever the backend might omit them.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use super::{STATUS_SUCCESS, TOKEN_EXPIRED_CODE};

// ============================================================================
// ConnectResponse
// ============================================================================

/// Body of a successful connect handshake.
///
/// # Format
///
/// ```json
/// {
///   "status": "success",
///   "time": "2021-06-22 00:00:00",
///   "id": "socket id"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    /// Backend acceptance marker.
    #[serde(default)]
    pub status: String,

    /// Initial polling cursor.
    #[serde(default)]
    pub time: String,

    /// Server-assigned socket identifier. Tolerates a numeric id from
    /// older backends.
    #[serde(default)]
    pub id: Option<Value>,
}

impl ConnectResponse {
    /// Returns `true` if the backend accepted the handshake.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Returns the socket identifier as a string, if present.
    #[must_use]
    pub fn id_str(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// PollResponse
// ============================================================================

/// Body of a successful receive (poll) response.
///
/// # Format
///
/// ```json
/// {
///   "status": "success",
///   "time": "2021-06-22 00:00:05",
///   "events": [
///     {"channel": {"name": "room"}, "event": "msg", "payload": {"text": "hi"}}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PollResponse {
    /// Backend acceptance marker.
    #[serde(default)]
    pub status: String,

    /// Advanced polling cursor.
    #[serde(default)]
    pub time: String,

    /// Events generated since the previous cursor.
    #[serde(default)]
    pub events: Vec<EventItem>,
}

impl PollResponse {
    /// Returns `true` if the backend accepted the poll.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// One inbound event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventItem {
    /// Channel the event was broadcast on.
    pub channel: ChannelRef,

    /// Event name.
    pub event: String,

    /// Event payload delivered to listeners.
    #[serde(default)]
    pub payload: Value,
}

/// Channel reference inside an event item.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRef {
    /// Channel name.
    pub name: String,
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// Body of a recoverable failure response.
///
/// # Format
///
/// ```json
/// {
///   "status": "error",
///   "data": {"code": "TOKEN_EXPIRED"},
///   "message": "Session expired"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Backend failure marker.
    #[serde(default)]
    pub status: String,

    /// Structured error details.
    #[serde(default)]
    pub data: ErrorData,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Structured error details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorData {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: String,
}

impl ErrorResponse {
    /// Returns `true` if this failure is an expired session token.
    #[inline]
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        self.data.code == TOKEN_EXPIRED_CODE
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_response_parse() {
        let body = r#"{"status": "success", "time": "2021-06-22 00:00:00", "id": "s1"}"#;
        let response: ConnectResponse = serde_json::from_str(body).expect("parse");

        assert!(response.is_success());
        assert_eq!(response.time, "2021-06-22 00:00:00");
        assert_eq!(response.id_str().as_deref(), Some("s1"));
    }

    #[test]
    fn test_connect_response_numeric_id() {
        let body = r#"{"status": "success", "time": "1", "id": 7}"#;
        let response: ConnectResponse = serde_json::from_str(body).expect("parse");

        assert_eq!(response.id_str().as_deref(), Some("7"));
    }

    #[test]
    fn test_connect_response_empty_body_not_success() {
        let response: ConnectResponse = serde_json::from_str("{}").expect("parse");
        assert!(!response.is_success());
        assert!(response.id_str().is_none());
    }

    #[test]
    fn test_poll_response_parse() {
        let body = r#"{
            "status": "success",
            "time": "t2",
            "events": [
                {"channel": {"name": "room"}, "event": "msg", "payload": {"text": "hi"}}
            ]
        }"#;
        let response: PollResponse = serde_json::from_str(body).expect("parse");

        assert!(response.is_success());
        assert_eq!(response.events.len(), 1);
        assert_eq!(response.events[0].channel.name, "room");
        assert_eq!(response.events[0].event, "msg");
    }

    #[test]
    fn test_poll_response_missing_events_defaults_empty() {
        let response: PollResponse =
            serde_json::from_str(r#"{"status": "success", "time": "t2"}"#).expect("parse");
        assert!(response.events.is_empty());
    }

    #[test]
    fn test_error_response_token_expired() {
        let body = r#"{"status": "error", "data": {"code": "TOKEN_EXPIRED"}, "message": "expired"}"#;
        let response: ErrorResponse = serde_json::from_str(body).expect("parse");

        assert!(response.is_token_expired());
    }

    #[test]
    fn test_error_response_other_code() {
        let body = r#"{"status": "error", "data": {"code": "FORBIDDEN"}}"#;
        let response: ErrorResponse = serde_json::from_str(body).expect("parse");

        assert!(!response.is_token_expired());
    }
}
