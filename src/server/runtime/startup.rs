use std::process::ExitCode;

use anyhow::{Context, Error, Result};
use rmcp::ServiceExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    cli::{LaunchProfile, TransportMode},
    lib::telemetry::{emit_runtime_mode, RuntimeModeTelemetry},
    server::{
        config::{ServerConfig, SessionConfig},
        http::{self, AppState},
        runtime::{build_instructions, WeatherServer},
        session::{spawn_idle_reaper, SessionBroker},
    },
};

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

/// Start the MCP server on the transport selected by the launch profile.
pub async fn run_server(profile: LaunchProfile, config: ServerConfig) -> Result<(), RuntimeExit> {
    let instructions = build_instructions(&profile, &config);
    let server =
        WeatherServer::new(&config, instructions.clone()).map_err(RuntimeExit::from_error)?;

    emit_runtime_mode(&RuntimeModeTelemetry {
        transport: profile.transport.as_str(),
        host: Some(config.server.host.as_str()),
        port: Some(config.server.port),
        config_path: config.source_path.to_string_lossy().as_ref(),
        json_response: config.server.json_response,
        instructions: &instructions,
        launch_args: &profile.launch_args,
    });

    match profile.transport {
        TransportMode::Stdio => run_stdio(server).await,
        TransportMode::Http => run_http(server, &config).await,
    }
}

async fn run_stdio(server: WeatherServer) -> Result<(), RuntimeExit> {
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(RuntimeExit::from_error)?;
    running.waiting().await.map_err(RuntimeExit::from_error)?;
    Ok(())
}

async fn run_http(server: WeatherServer, config: &ServerConfig) -> Result<(), RuntimeExit> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind TCP port {addr}"))
        .map_err(RuntimeExit::from_error)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    serve_http(
        listener,
        server,
        config.session.clone(),
        config.server.json_response,
        shutdown,
    )
    .await
    .map_err(RuntimeExit::from_error)
}

/// Serve the streamable HTTP transport on an already-bound listener.
///
/// Runs the idle reaper alongside the router and closes every live session once
/// `shutdown` is cancelled.
pub async fn serve_http(
    listener: TcpListener,
    server: WeatherServer,
    session: SessionConfig,
    json_response: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    let broker = SessionBroker::new(server, session);
    let reaper = spawn_idle_reaper(broker.clone(), shutdown.clone());
    let state = AppState {
        broker: broker.clone(),
        json_response,
    };

    let signal = shutdown.clone();
    let result = http::serve(listener, state, async move { signal.cancelled().await }).await;

    shutdown.cancel();
    if let Some(handle) = reaper {
        if let Err(err) = handle.await {
            warn!(
                target: "weather_mcp::runtime",
                error = %err,
                "Idle reaper task ended abnormally"
            );
        }
    }
    let closed = broker.close_all().await;
    info!(
        target: "weather_mcp::runtime",
        closed_sessions = closed,
        "HTTP transport stopped"
    );
    result
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!(
                target: "weather_mcp::runtime",
                "Received Ctrl-C; shutting down"
            );
            shutdown.cancel();
        }
        Err(err) => {
            warn!(
                target: "weather_mcp::runtime",
                error = %err,
                "Unable to listen for Ctrl-C; shutdown only on server exit"
            );
        }
    }
}
