use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::{CallToolResult, ErrorData, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::{
    lib::errors::WeatherError,
    server::config::ServerConfig,
    tools::weather::{self, OpenMeteoClient, WeatherQuery},
};

/// rmcp service exposing `weather_by_city`. Cloned once per session.
#[derive(Clone)]
pub struct WeatherServer {
    instructions: Arc<String>,
    tool_router: ToolRouter<Self>,
    provider: OpenMeteoClient,
}

impl WeatherServer {
    pub fn new(config: &ServerConfig, instructions: String) -> Result<Self, WeatherError> {
        let provider = OpenMeteoClient::new(&config.weather)?;
        Ok(Self {
            instructions: Arc::new(instructions),
            tool_router: Self::tool_router(),
            provider,
        })
    }
}

#[tool_router(router = tool_router)]
impl WeatherServer {
    #[tool(
        name = "weather_by_city",
        description = "Current conditions and a short hourly forecast for a city (Open-Meteo). Returns a text summary and a link to the raw forecast JSON."
    )]
    async fn weather_by_city(
        &self,
        Parameters(request): Parameters<WeatherQuery>,
    ) -> Result<CallToolResult, ErrorData> {
        weather::run_tool_call(&self.provider, request).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some((*self.instructions).clone()),
            ..ServerInfo::default()
        }
    }
}
