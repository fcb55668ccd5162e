use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::lib::{
    errors::SessionError,
    jsonrpc::{ErrorEnvelope, INVALID_REQUEST_CODE, NO_VALID_SESSION_CODE, PARSE_ERROR_CODE},
};

/// Failures surfaced by the `/mcp` endpoint.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid Request: batch messages are not supported")]
    Batch,
    #[error("Invalid Request: body is not a JSON-RPC 2.0 message")]
    InvalidMessage,
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl HttpError {
    fn envelope(code: i64, message: String) -> Response {
        let body = ErrorEnvelope::new(code, message, Value::Null);
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Parse(_) => {
                warn!(target: "weather_mcp::http", error = %self, "Rejected unparsable body");
                Self::envelope(PARSE_ERROR_CODE, self.to_string())
            }
            HttpError::Batch | HttpError::InvalidMessage => {
                warn!(target: "weather_mcp::http", error = %self, "Rejected request body");
                Self::envelope(INVALID_REQUEST_CODE, self.to_string())
            }
            HttpError::Session(
                err @ (SessionError::NoValidSession | SessionError::NotInitialized { .. }),
            ) => Self::envelope(NO_VALID_SESSION_CODE, err.to_string()),
            HttpError::Session(err) => {
                error!(target: "weather_mcp::http", error = %err, "Session request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
