//! Minimal streamable HTTP client used by `weather-mcp call` and the tests.

mod decoder;

use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    lib::{
        errors::ClientError,
        jsonrpc::{initialized_notification, INITIALIZE_METHOD, JSONRPC_VERSION},
    },
    server::http::MCP_SESSION_ID_HEADER,
    tools::weather::{Units, WEATHER_TOOL_ID},
};

pub use decoder::ResponseDecoder;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/mcp";
pub const PROTOCOL_VERSION: &str = "2025-03-26";
const ACCEPT_ANY: &str = "application/json, text/event-stream";

/// Text and link extracted from a `tools/call` result.
#[derive(Debug, Clone)]
pub struct ToolCallOutput {
    pub text: String,
    pub is_error: bool,
    pub resource_uri: Option<String>,
    pub raw: Value,
}

impl ToolCallOutput {
    fn from_result(result: Value) -> Self {
        let items = result
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let text = items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        let resource_uri = items
            .iter()
            .find(|item| item.get("type").and_then(Value::as_str) == Some("resource_link"))
            .and_then(|item| item.get("uri").and_then(Value::as_str))
            .map(str::to_string);
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            text,
            is_error,
            resource_uri,
            raw: result,
        }
    }
}

/// One client session against a `POST /mcp` endpoint.
#[derive(Debug)]
pub struct WeatherClient {
    http: Client,
    endpoint: String,
    session_id: Option<String>,
    next_id: u64,
}

impl WeatherClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            session_id: None,
            next_id: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Open a session and send `notifications/initialized`.
    ///
    /// Returns the server's `initialize` result.
    pub async fn initialize(&mut self) -> Result<Value, ClientError> {
        let request = self.request_message(
            INITIALIZE_METHOD,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        );
        let response = self.post(&request, None).await?;
        let session_id = response
            .headers()
            .get(MCP_SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(ClientError::MissingSessionId)?;
        let result = Self::read_result(response).await?;
        debug!(
            target: "weather_mcp::client",
            session_id = %session_id,
            "Session initialized"
        );
        self.session_id = Some(session_id);

        let notification = initialized_notification();
        self.send(&notification).await?;
        Ok(result)
    }

    pub async fn list_tools(&mut self) -> Result<Value, ClientError> {
        self.call("tools/list", json!({})).await
    }

    pub async fn call_weather(
        &mut self,
        city: &str,
        units: Units,
    ) -> Result<ToolCallOutput, ClientError> {
        let result = self
            .call(
                "tools/call",
                json!({
                    "name": WEATHER_TOOL_ID,
                    "arguments": { "city": city, "units": units.as_str() }
                }),
            )
            .await?;
        Ok(ToolCallOutput::from_result(result))
    }

    /// Send a request on the current session and return its `result`.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let session_id = self.session_id.clone().ok_or(ClientError::NotConnected)?;
        let request = self.request_message(method, params);
        let response = self.post(&request, Some(&session_id)).await?;
        Self::read_result(response).await
    }

    /// Send a notification on the current session.
    pub async fn send(&self, message: &Value) -> Result<(), ClientError> {
        let session_id = self.session_id.as_deref().ok_or(ClientError::NotConnected)?;
        let response = self.post(message, Some(session_id)).await?;
        Self::ensure_success(response).await.map(drop)
    }

    /// Ask the server to drop the session. A no-op when not connected.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let response = self
            .http
            .delete(&self.endpoint)
            .header(MCP_SESSION_ID_HEADER, &session_id)
            .send()
            .await
            .map_err(|source| self.http_error(source))?;
        Self::ensure_success(response).await.map(drop)
    }

    fn request_message(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method,
            "params": params,
        })
    }

    async fn post(&self, message: &Value, session_id: Option<&str>) -> Result<Response, ClientError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(header::ACCEPT, ACCEPT_ANY)
            .json(message);
        if let Some(id) = session_id {
            request = request.header(MCP_SESSION_ID_HEADER, id);
        }
        request.send().await.map_err(|source| self.http_error(source))
    }

    async fn read_result(response: Response) -> Result<Value, ClientError> {
        let response = Self::ensure_success(response).await?;
        let decoder = ResponseDecoder::from_content_type(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        let endpoint = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })?;
        let message = decoder.decode(&body)?;

        if let Some(error) = message.get("error") {
            return Err(ClientError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(message.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn http_error(&self, source: reqwest::Error) -> ClientError {
        ClientError::Http {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}
