//! Minimal JSON-RPC 2.0 envelope helpers used at the HTTP boundary.
//!
//! Payloads stay as `serde_json::Value` here; typed decoding is rmcp's job
//! inside each session.
use serde::Serialize;
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Reserved server error used when a request carries no usable session.
pub const NO_VALID_SESSION_CODE: i64 = -32000;
pub const PARSE_ERROR_CODE: i64 = -32700;
pub const INVALID_REQUEST_CODE: i64 = -32600;

pub const INITIALIZE_METHOD: &str = "initialize";
pub const INITIALIZED_NOTIFICATION: &str = "notifications/initialized";

/// Shape of a single JSON-RPC message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Notification,
    Response,
    Invalid,
}

impl MessageKind {
    pub fn of(message: &Value) -> Self {
        let Some(object) = message.as_object() else {
            return MessageKind::Invalid;
        };
        let has_id = object.get("id").is_some_and(|id| !id.is_null());
        match (object.get("method").and_then(Value::as_str), has_id) {
            (Some(_), true) => MessageKind::Request,
            (Some(_), false) => MessageKind::Notification,
            (None, true) if object.contains_key("result") || object.contains_key("error") => {
                MessageKind::Response
            }
            _ => MessageKind::Invalid,
        }
    }
}

/// JSON-RPC 2.0 error response with an explicit (possibly null) id.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub jsonrpc: &'static str,
    pub error: ErrorBody,
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: i64,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(code: i64, message: impl Into<String>, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: ErrorBody {
                code,
                message: message.into(),
            },
            id,
        }
    }
}

/// True when `message` is a well-formed `initialize` request.
pub fn is_initialize_request(message: &Value) -> bool {
    if MessageKind::of(message) != MessageKind::Request {
        return false;
    }
    if message.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return false;
    }
    if message.get("method").and_then(Value::as_str) != Some(INITIALIZE_METHOD) {
        return false;
    }
    let Some(params) = message.get("params").and_then(Value::as_object) else {
        return false;
    };
    params
        .get("protocolVersion")
        .is_some_and(|value| value.is_string())
        && params.get("clientInfo").is_some_and(|value| value.is_object())
}

pub fn is_initialized_notification(message: &Value) -> bool {
    MessageKind::of(message) == MessageKind::Notification
        && message.get("method").and_then(Value::as_str) == Some(INITIALIZED_NOTIFICATION)
}

pub fn initialized_notification() -> Value {
    json!({ "jsonrpc": JSONRPC_VERSION, "method": INITIALIZED_NOTIFICATION })
}

/// True for a response carrying `result` (as opposed to `error`).
pub fn is_success_response(message: &Value) -> bool {
    MessageKind::of(message) == MessageKind::Response && message.get("result").is_some()
}
