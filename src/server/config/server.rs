use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Server socket and response framing settings.
#[derive(Debug, Clone)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Always answer with a single JSON object instead of an event stream.
    pub json_response: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            json_response: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub json_response: Option<bool>,
}

/// Parse `[server]`; `port_override` is the raw `PORT` environment value.
pub fn parse_server_section(
    raw: Option<RawServerSection>,
    port_override: Option<&str>,
    path: &Path,
) -> Result<ServerSection, ConfigError> {
    let server_raw = raw.unwrap_or_default();
    let host = server_raw.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    if host.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "server.host",
            message: "host must not be empty".into(),
        });
    }

    let port = match port_override.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "server.port",
            message: format!("PORT `{value}` is not a valid port number"),
        })?,
        None => server_raw.port.unwrap_or(DEFAULT_PORT),
    };
    validate_port(port, path)?;

    Ok(ServerSection {
        host,
        port,
        json_response: server_raw.json_response.unwrap_or(false),
    })
}

fn validate_port(port: u16, path: &Path) -> Result<(), ConfigError> {
    if port != 0 {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "server.port",
        message: "Use a port in the range 1-65535".into(),
    })
}
