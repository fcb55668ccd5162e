use std::time::Duration;

use anyhow::Result;
use rmcp::{model::ClientInfo, serve_client};
use tokio::time::timeout;

use crate::common::{fixture, spawn_stdio_server};

#[tokio::test]
async fn stdio_transport_lists_weather_tool() -> Result<()> {
    let (mut child, pipes, stderr_task) =
        spawn_stdio_server(&fixture("tests/fixtures/config_valid.toml")).await?;

    let client = serve_client(ClientInfo::default(), pipes).await?;
    let list = client.list_tools(None).await?;
    assert!(
        list.tools
            .iter()
            .any(|tool| tool.name.as_ref() == "weather_by_city"),
        "list_tools should include weather_by_city: {:?}",
        list.tools
    );

    client.cancel().await?;
    let status = timeout(Duration::from_secs(5), child.wait()).await??;
    let stderr = stderr_task.await?;
    assert!(
        status.success(),
        "server should exit cleanly but exit status was {status:?}; stderr: {stderr}"
    );
    Ok(())
}

#[tokio::test]
async fn missing_explicit_config_fails_startup() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let missing = temp.path().join("absent.toml");
    let (mut child, _pipes, stderr_task) =
        spawn_stdio_server(&missing.display().to_string()).await?;

    let status = timeout(Duration::from_secs(5), child.wait()).await??;
    let stderr = stderr_task.await?;
    assert!(!status.success(), "startup must fail: {status:?}");
    assert!(stderr.contains("absent.toml"), "stderr: {stderr}");
    Ok(())
}
