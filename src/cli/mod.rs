//! CLI entrypoint module structure.
use anyhow::{anyhow, Context, Result};

use crate::client::WeatherClient;

pub mod args;
pub mod profile;

pub use args::{CallArgs, CliCommand, LaunchProfileArgs, ParsedCommand, UnitsArg};
pub use profile::{
    build_launch_args, resolve_config_path, ConfigSource, LaunchProfile, TransportMode,
};

/// Execute CLI command mode and return the text to print.
pub async fn execute_cli_command(command: CliCommand) -> Result<String> {
    match command {
        CliCommand::Call(args) => call_weather(args).await,
    }
}

async fn call_weather(args: CallArgs) -> Result<String> {
    let mut client = WeatherClient::new(args.endpoint.clone());
    client
        .initialize()
        .await
        .with_context(|| format!("failed to open a session at {}", args.endpoint))?;
    let session_id = client.session_id().map(str::to_string);

    let outcome = client.call_weather(&args.city, args.units.into()).await;
    if !args.keep_session {
        client.close().await.context("failed to close the session")?;
    }
    let output = outcome.context("weather_by_city call failed")?;
    if output.is_error {
        return Err(anyhow!(output.text));
    }

    let mut lines = vec![output.text];
    if let Some(uri) = output.resource_uri {
        lines.push(format!("Forecast data: {uri}"));
    }
    if let (true, Some(id)) = (args.keep_session, session_id) {
        lines.push(format!("Session: {id}"));
    }
    Ok(lines.join("\n"))
}
