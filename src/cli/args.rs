//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;

use crate::{
    client::DEFAULT_ENDPOINT,
    tools::weather::{Units, MIN_CITY_LEN},
};

use super::{build_launch_args, resolve_config_path, LaunchProfile, TransportMode};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    RunServer(LaunchProfile),
    Cli(CliCommand),
}

/// Top-level optional CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Call weather_by_city on a running server and print the result.
    #[command(
        about = "Call weather_by_city on a running server",
        after_help = "Hint: start the server first with `weather-mcp --transport http`."
    )]
    Call(CallArgs),
}

/// Unit system accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum UnitsArg {
    Metric,
    Imperial,
}

impl From<UnitsArg> for Units {
    fn from(value: UnitsArg) -> Self {
        match value {
            UnitsArg::Metric => Units::Metric,
            UnitsArg::Imperial => Units::Imperial,
        }
    }
}

/// Arguments for `call`.
#[derive(Debug, Clone, Args)]
pub struct CallArgs {
    /// City to look up, e.g. "Paris" or "Springfield, US".
    pub city: String,
    #[arg(long, value_enum, default_value_t = UnitsArg::Metric)]
    pub units: UnitsArg,
    /// Streamable HTTP endpoint of the server.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// Leave the session open and print its id.
    #[arg(long, default_value_t = false)]
    pub keep_session: bool,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Weather MCP server (weather_by_city over streamable HTTP or stdio)",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Select http (default) or stdio.
    #[arg(long, value_enum, default_value_t = TransportMode::Http)]
    pub transport: TransportMode,
    /// Path to config.toml (overrides MCP_CONFIG_PATH).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Optional CLI command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from CLI args and environment variables.
    pub fn build(self) -> Result<LaunchProfile> {
        let (config_path, config_source) = resolve_config_path(self.config_override)?;
        let launch_args = build_launch_args(self.transport, &config_path);

        Ok(LaunchProfile {
            config_path,
            config_source,
            transport: self.transport,
            launch_args,
        })
    }

    /// Parse CLI args into either server launch mode or utility command mode.
    pub fn into_command(self) -> Result<ParsedCommand> {
        match self.command {
            Some(command) => {
                validate_command(&command)?;
                Ok(ParsedCommand::Cli(command))
            }
            None => Ok(ParsedCommand::RunServer(self.build()?)),
        }
    }
}

fn validate_command(command: &CliCommand) -> Result<()> {
    match command {
        CliCommand::Call(args) => {
            if args.city.trim().chars().count() < MIN_CITY_LEN {
                return Err(anyhow!(
                    "invalid city: use at least {MIN_CITY_LEN} characters"
                ));
            }
            let endpoint = Url::parse(&args.endpoint)
                .map_err(|err| anyhow!("invalid endpoint `{}`: {err}", args.endpoint))?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "invalid endpoint `{}`: use an http or https URL",
                    args.endpoint
                ));
            }
        }
    }

    Ok(())
}
