use tracing::{info, warn};

use super::{ServerConfig, PORT_ENV_KEY};

pub fn log_missing_optional(path: &std::path::Path) {
    warn!(
        target: "weather_mcp::config",
        path = %path.display(),
        "Configuration file not found; using built-in defaults"
    );
}

pub fn log_port_override(port: &str) {
    info!(
        target: "weather_mcp::config",
        env = PORT_ENV_KEY,
        port,
        "Listening port overridden by environment"
    );
}

pub fn log_loaded(config: &ServerConfig) {
    info!(
        target: "weather_mcp::config",
        path = %config.source_path.display(),
        host = %config.server.host,
        port = config.server.port,
        json_response = config.server.json_response,
        geocoding_url = %config.weather.geocoding_url,
        forecast_url = %config.weather.forecast_url,
        request_timeout_secs = config.weather.request_timeout_secs,
        idle_timeout_secs = config.session.idle_timeout_secs,
        "Configuration loaded successfully"
    );
}
