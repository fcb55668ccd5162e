use anyhow::Result;
use rmcp::{
    model::{CallToolRequestParam, ClientInfo},
    serve_client, ServiceExt,
};
use serde_json::json;
use weather_mcp::server::runtime::WeatherServer;

use crate::common::{config_for, MockOpenMeteo};

#[tokio::test]
async fn rmcp_client_sees_schema_and_resource_link() -> Result<()> {
    let mock = MockOpenMeteo::start().await?;
    let config = config_for(&mock, true);
    let server = WeatherServer::new(&config, "in-process".into())?;

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });
    let client = serve_client(ClientInfo::default(), client_io).await?;

    let info = client.peer_info().expect("server info after handshake");
    assert!(info.capabilities.tools.is_some());
    assert!(info
        .instructions
        .as_deref()
        .is_some_and(|text| text.contains("in-process")));

    let tools = client.list_tools(None).await?;
    let tool = tools
        .tools
        .iter()
        .find(|tool| tool.name.as_ref() == "weather_by_city")
        .expect("weather_by_city registered");
    let schema = serde_json::to_value(tool.input_schema.as_ref())?;
    assert_eq!(schema["properties"]["city"]["type"], "string");
    assert_eq!(schema["properties"]["city"]["minLength"], 2);
    assert_eq!(schema["required"], json!(["city"]));

    let arguments = json!({ "city": "Paris", "units": "metric" });
    let result = client
        .call_tool(CallToolRequestParam {
            name: "weather_by_city".into(),
            arguments: arguments.as_object().cloned(),
        })
        .await?;
    assert_eq!(result.is_error, Some(false));
    assert_eq!(result.content.len(), 2);
    let link = serde_json::to_value(&result.content[1])?;
    assert_eq!(link["type"], "resource_link");
    assert_eq!(link["name"], "open-meteo-forecast");
    assert_eq!(link["mimeType"], "application/json");
    assert!(link["uri"]
        .as_str()
        .is_some_and(|uri| uri.contains("temperature_unit=celsius")));

    client.cancel().await?;
    server_task.await??;
    Ok(())
}
