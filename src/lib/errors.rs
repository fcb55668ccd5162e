use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use rmcp::model::ErrorData;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures talking to the upstream weather provider.
///
/// Every variant aborts the current tool call only; the message is surfaced to
/// the caller as a tool-execution error.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Geocoding lookup failed: HTTP {status}")]
    GeocodingStatus { status: u16 },
    #[error("Forecast failed: HTTP {status}")]
    ForecastStatus { status: u16 },
    #[error("Geocoding result has no usable coordinates")]
    MissingCoordinates,
    #[error("{stage} request failed: {source}")]
    Request {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{stage} response could not be decoded: {source}")]
    Decode {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

/// Failures raised by a session transport or the broker in front of it.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Bad Request: No valid session ID provided")]
    NoValidSession,
    #[error("Session {id} is closed")]
    Closed { id: String },
    #[error("Session {id} has not completed initialization")]
    NotInitialized { id: String },
    #[error("Session {id} already registered")]
    Duplicate { id: String },
    #[error("Session {id} did not answer within {timeout_secs} seconds")]
    ResponseTimeout { id: String, timeout_secs: u64 },
    #[error("Session {id} channel failed: {source}")]
    Channel {
        id: String,
        #[source]
        source: io::Error,
    },
    #[error("Session {id} emitted an unreadable message: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the companion test client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Server answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Server did not return an mcp-session-id header")]
    MissingSessionId,
    #[error("Client has no active session; call initialize first")]
    NotConnected,
    #[error("Response body is not valid JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
    #[error("Event stream contained no parseable data frame")]
    EmptyEventStream,
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Static description of a rejected tool argument set.
///
/// Rendered as a JSON-RPC `invalid_params` error whose `data` object carries
/// `code`, `remediation`, `retryable` and `details`, plus any context fields.
#[derive(Debug, Clone, Copy)]
pub struct ToolErrorDescriptor {
    pub code: &'static str,
    pub message: &'static str,
    pub remediation: &'static str,
    pub retryable: bool,
}

impl ToolErrorDescriptor {
    pub const fn new(
        code: &'static str,
        message: &'static str,
        remediation: &'static str,
        retryable: bool,
    ) -> Self {
        Self {
            code,
            message,
            remediation,
            retryable,
        }
    }

    /// Render as `invalid_params`; `context` entries land beside the fixed keys.
    pub fn invalid_params<I>(&self, details: Value, context: I) -> ErrorData
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let mut data = Map::new();
        data.insert("code".into(), Value::from(self.code));
        data.insert("remediation".into(), Value::from(self.remediation));
        data.insert("retryable".into(), Value::Bool(self.retryable));
        data.insert("details".into(), details);
        data.extend(
            context
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        ErrorData::invalid_params(self.message, Some(Value::Object(data)))
    }
}
