//! Streamable HTTP endpoint: `POST /mcp`, `DELETE /mcp`, and a banner on `/`.
//!
//! Requests are answered either as a single JSON object or as a short event
//! stream whose last frame is the response, depending on `server.json_response`
//! and the client's `Accept` header.

mod error;

use std::{convert::Infallible, future::Future};

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    lib::jsonrpc::MessageKind,
    server::session::{Delivery, SessionBroker},
};

pub use error::HttpError;

/// Header carrying the session id in both directions.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";
pub const MCP_PATH: &str = "/mcp";

const BANNER: &str = "weather-mcp is running. POST JSON-RPC messages to /mcp.\n";
const EVENT_STREAM: &str = "text/event-stream";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub broker: SessionBroker,
    /// Answer requests with plain JSON even when the client accepts SSE.
    pub json_response: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route(MCP_PATH, post(mcp_post).delete(mcp_delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router(state)` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("failed to read listener address")?;
    info!(
        target: "weather_mcp::http",
        bind_addr = %local_addr,
        path = MCP_PATH,
        "Listening for streamable HTTP clients"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn banner() -> &'static str {
    BANNER
}

async fn mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let message: Value = serde_json::from_slice(&body).map_err(HttpError::Parse)?;
    if message.is_array() {
        return Err(HttpError::Batch);
    }
    if MessageKind::of(&message) == MessageKind::Invalid {
        return Err(HttpError::InvalidMessage);
    }

    let session_id = session_id_from(&headers);
    let routed = state.broker.handle(session_id, message).await?;

    let mut response = match routed.delivery {
        Delivery::Accepted => StatusCode::ACCEPTED.into_response(),
        Delivery::Reply { events, response } => {
            if state.json_response || !accepts_event_stream(&headers) {
                Json(response).into_response()
            } else {
                event_stream(events, response)
            }
        }
    };

    if let Ok(value) = HeaderValue::from_str(routed.session_id.as_str()) {
        response.headers_mut().insert(MCP_SESSION_ID_HEADER, value);
    }
    Ok(response)
}

async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(id) = session_id_from(&headers) {
        let closed = state.broker.close(id).await;
        debug!(
            target: "weather_mcp::http",
            session_id = id,
            closed,
            "Handled session delete"
        );
    }
    StatusCode::NO_CONTENT
}

fn session_id_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(EVENT_STREAM))
}

fn event_stream(events: Vec<Value>, response: Value) -> Response {
    let frames = events
        .into_iter()
        .chain(std::iter::once(response))
        .map(|message| {
            Ok::<Event, Infallible>(Event::default().event("message").data(message.to_string()))
        })
        .collect::<Vec<_>>();
    Sse::new(stream::iter(frames)).into_response()
}
