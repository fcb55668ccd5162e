//! MCP tools registered on [`crate::server::runtime::WeatherServer`].

pub mod weather;
