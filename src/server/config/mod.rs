//! Load and validate server configuration.
use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod server;
pub mod session;
pub mod telemetry;
pub mod weather;

pub use server::{parse_server_section, RawServerSection, ServerSection, DEFAULT_HOST, DEFAULT_PORT};
pub use session::{
    parse_session_section, RawSessionConfig, SessionConfig, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_RESPONSE_TIMEOUT_SECS, DEFAULT_SESSION_CLEANUP_SECS,
};
pub use weather::{
    parse_weather_section, RawWeatherConfig, WeatherConfig, DEFAULT_FORECAST_URL,
    DEFAULT_GEOCODING_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};

pub const CONFIG_ENV_KEY: &str = "MCP_CONFIG_PATH";
pub const PORT_ENV_KEY: &str = "PORT";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub weather: WeatherConfig,
    pub session: SessionConfig,
    pub source_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            weather: WeatherConfig::default(),
            session: SessionConfig::default(),
            source_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

/// Environment values layered on top of the file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: env::var(PORT_ENV_KEY).ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawServerConfig {
    server: Option<RawServerSection>,
    weather: Option<RawWeatherConfig>,
    session: Option<RawSessionConfig>,
}

impl ServerConfig {
    /// Load configuration, applying `PORT` from the process environment.
    pub fn load(path: PathBuf, required: bool) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, required, &EnvOverrides::from_env())
    }

    /// Load configuration with explicit environment overrides.
    pub fn load_with_overrides(
        path: PathBuf,
        required: bool,
        overrides: &EnvOverrides,
    ) -> Result<Self, ConfigError> {
        info!(
            target: "weather_mcp::config",
            path = %path.display(),
            required,
            "Starting configuration load"
        );

        if !required && !path.exists() {
            telemetry::log_missing_optional(&path);
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path.clone()).required(required));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "weather_mcp::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawServerConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "weather_mcp::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, overrides, path.clone()).map_err(|err| {
            error!(
                target: "weather_mcp::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(
        raw: RawServerConfig,
        overrides: &EnvOverrides,
        path: PathBuf,
    ) -> Result<Self, ConfigError> {
        if let Some(port) = overrides.port.as_deref() {
            telemetry::log_port_override(port);
        }
        let server = parse_server_section(raw.server, overrides.port.as_deref(), &path)?;
        let weather = parse_weather_section(raw.weather, &path)?;
        let session = parse_session_section(raw.session, &path)?;

        Ok(Self {
            server,
            weather,
            session,
            source_path: path,
        })
    }
}
