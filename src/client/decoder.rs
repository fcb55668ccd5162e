use serde_json::Value;

use crate::lib::errors::ClientError;

const EVENT_STREAM: &str = "text/event-stream";

/// How a `POST /mcp` reply body is framed, picked from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDecoder {
    Json,
    EventStream,
}

impl ResponseDecoder {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(value) if value.contains(EVENT_STREAM) => ResponseDecoder::EventStream,
            _ => ResponseDecoder::Json,
        }
    }

    /// Decode the body into the JSON-RPC message it carries.
    ///
    /// For event streams the last frame whose data parses as JSON wins.
    pub fn decode(self, body: &str) -> Result<Value, ClientError> {
        match self {
            ResponseDecoder::Json => {
                serde_json::from_str(body).map_err(|source| ClientError::Json { source })
            }
            ResponseDecoder::EventStream => event_data(body)
                .iter()
                .rev()
                .find_map(|data| serde_json::from_str(data).ok())
                .ok_or(ClientError::EmptyEventStream),
        }
    }
}

/// Data payloads of each event, with multi-line `data:` fields joined by `\n`.
fn event_data(body: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Option<String> = None;

    for line in body.lines() {
        if line.trim().is_empty() {
            events.extend(current.take());
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        match current.as_mut() {
            Some(buffer) => {
                buffer.push('\n');
                buffer.push_str(data);
            }
            None => current = Some(data.to_string()),
        }
    }
    events.extend(current);
    events
}
