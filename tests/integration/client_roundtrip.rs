use anyhow::Result;
use weather_mcp::{
    cli::{execute_cli_command, CallArgs, CliCommand, UnitsArg},
    client::WeatherClient,
    tools::weather::Units,
};

use crate::common::TestServer;

fn call(endpoint: &str, city: &str, keep_session: bool) -> CliCommand {
    CliCommand::Call(CallArgs {
        city: city.into(),
        units: UnitsArg::Imperial,
        endpoint: endpoint.into(),
        keep_session,
    })
}

#[tokio::test]
async fn client_round_trip_over_event_stream() -> Result<()> {
    let server = TestServer::start(false).await?;
    let mut client = WeatherClient::new(server.endpoint.clone());

    let info = client.initialize().await?;
    assert_eq!(info["serverInfo"]["name"], "weather-mcp");
    assert!(client.session_id().is_some());

    let tools = client.list_tools().await?;
    let tool = tools["tools"]
        .as_array()
        .and_then(|tools| tools.iter().find(|tool| tool["name"] == "weather_by_city"))
        .cloned()
        .expect("weather_by_city is listed");
    assert!(tool["inputSchema"]["properties"]["city"].is_object(), "{tool}");

    let output = client.call_weather("Paris", Units::Metric).await?;
    assert!(output.text.starts_with("Weather for Paris"), "{}", output.text);

    client.close().await?;
    assert!(client.session_id().is_none());
    server.stop().await
}

#[tokio::test]
async fn call_command_prints_summary_and_link() -> Result<()> {
    let server = TestServer::start(true).await?;

    let printed = execute_cli_command(call(&server.endpoint, "Springfield", false)).await?;
    assert!(
        printed.starts_with("Weather for Springfield, Illinois, US"),
        "{printed}"
    );
    assert!(printed.contains("°F"), "{printed}");
    assert!(printed.contains("Forecast data: http://"), "{printed}");
    assert!(!printed.contains("Session:"), "{printed}");

    let printed = execute_cli_command(call(&server.endpoint, "Springfield", true)).await?;
    assert!(printed.contains("Session: "), "{printed}");

    server.stop().await
}

#[tokio::test]
async fn call_command_reports_tool_errors() -> Result<()> {
    let server = TestServer::start(true).await?;

    let err = execute_cli_command(call(&server.endpoint, "Brokenville", false))
        .await
        .expect_err("forecast failure surfaces as an error");
    assert_eq!(err.to_string(), "Forecast failed: HTTP 502");

    server.stop().await
}
