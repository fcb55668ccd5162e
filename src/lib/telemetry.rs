//! Telemetry initialization and weather tool-call span helpers.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs.
///
/// Logs go to stderr so the stdio transport keeps stdout for protocol frames.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper recording the start and finish of one `weather_by_city` call.
pub struct ToolCallSpan {
    span: Span,
    started_at: Instant,
    call_id: Uuid,
}

impl ToolCallSpan {
    /// Start a tool-call span.
    pub fn start(tool: &'static str, city: &str, units: &'static str) -> Self {
        let call_id = Uuid::new_v4();
        let span = info_span!(
            target: "weather_mcp::weather",
            "tool_call",
            %call_id,
            tool,
            city,
            units
        );
        Self {
            span,
            started_at: Instant::now(),
            call_id,
        }
    }

    /// The call span; instrument the lookup future with it so upstream events nest under it.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording the outcome.
    pub fn finish(self, outcome: &'static str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "weather_mcp::weather",
            call_id = %self.call_id,
            outcome,
            elapsed_ms = elapsed_ms,
            "Completed weather tool call"
        );
    }
}

/// Payload for logging MCP runtime state as structured telemetry.
#[derive(Debug, Serialize)]
pub struct RuntimeModeTelemetry<'a> {
    pub transport: &'a str,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    pub config_path: &'a str,
    pub json_response: bool,
    pub instructions: &'a str,
    pub launch_args: &'a [String],
}

/// Emit runtime mode to `tracing`.
pub fn emit_runtime_mode(telemetry: &RuntimeModeTelemetry<'_>) {
    info!(
        target: "weather_mcp::runtime",
        transport = telemetry.transport,
        host = telemetry.host.unwrap_or(""),
        port = telemetry.port.unwrap_or_default(),
        config_path = telemetry.config_path,
        json_response = telemetry.json_response,
        instructions = telemetry.instructions,
        launch_args = ?telemetry.launch_args,
        "Started MCP server"
    );
}
