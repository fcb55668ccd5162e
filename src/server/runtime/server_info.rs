use crate::{cli::LaunchProfile, server::config::ServerConfig};

/// Build the `ServerInfo.instructions` string shown to MCP clients.
pub fn build_instructions(profile: &LaunchProfile, config: &ServerConfig) -> String {
    format!(
        "Call weather_by_city with a city name (at least 2 characters) and optional units (metric or imperial). Serving over {transport} (host={host}, port={port}); config {path}.",
        transport = profile.transport.as_str(),
        host = config.server.host,
        port = config.server.port,
        path = config.source_path.display(),
    )
}
