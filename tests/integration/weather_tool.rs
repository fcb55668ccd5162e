use anyhow::Result;
use weather_mcp::{
    client::WeatherClient,
    lib::errors::ClientError,
    tools::weather::{no_match_message, Units},
};

use crate::common::{
    TestServer, FORECAST_FAILURE_CITY, GEOCODING_FAILURE_CITY, NO_HOURLY_CITY,
    SPARSE_PLACE_CITY, UNKNOWN_CITY,
};

async fn connected(server: &TestServer) -> Result<WeatherClient> {
    let mut client = WeatherClient::new(server.endpoint.clone());
    client.initialize().await?;
    Ok(client)
}

#[tokio::test]
async fn metric_lookup_renders_summary_and_forecast_link() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client.call_weather("Paris", Units::Metric).await?;
    assert!(!output.is_error, "{}", output.text);
    let lines: Vec<&str> = output.text.lines().collect();
    assert_eq!(
        lines[0],
        "Weather for Paris, Île-de-France, FR (lat 48.85, lon 2.35)"
    );
    assert_eq!(lines[1], "Now: 18.4°C, wind 12 km/h, precipitation 0.2 mm");
    assert_eq!(lines[2], "Next hours:");
    assert_eq!(lines[3], "- 14:00: 18°C, precipitation 5%");
    assert_eq!(lines.len(), 3 + 6);
    assert!(!output.text.contains("°F"));

    let uri = output.resource_uri.expect("resource link present");
    assert!(uri.contains("temperature_unit=celsius"), "{uri}");
    assert!(uri.contains("wind_speed_unit=kmh"), "{uri}");
    assert!(uri.starts_with(&format!("http://{}/v1/forecast?", server.mock.addr)));

    let query = server.mock.last_forecast_query().expect("forecast requested");
    assert_eq!(query["forecast_days"], "1");
    assert_eq!(query["timezone"], "auto");
    assert_eq!(query["current"], "temperature_2m,wind_speed_10m,precipitation");

    client.close().await?;
    server.stop().await
}

#[tokio::test]
async fn imperial_lookup_uses_fahrenheit_and_mph() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client.call_weather("Springfield", Units::Imperial).await?;
    assert!(!output.is_error, "{}", output.text);
    assert!(output.text.contains("Now: 65.1°F, wind 7.5 mph"), "{}", output.text);
    assert!(!output.text.contains("°C"), "{}", output.text);
    assert!(!output.text.contains("km/h"), "{}", output.text);

    let uri = output.resource_uri.expect("resource link present");
    assert!(uri.contains("temperature_unit=fahrenheit"), "{uri}");
    assert!(uri.contains("wind_speed_unit=mph"), "{uri}");

    server.stop().await
}

#[tokio::test]
async fn malformed_place_fields_are_skipped_in_the_heading() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client.call_weather(SPARSE_PLACE_CITY, Units::Metric).await?;
    assert!(!output.is_error, "{}", output.text);
    let heading = output.text.lines().next().unwrap_or_default();
    assert_eq!(heading, "Weather for Nullville (lat 48.85, lon 2.35)");
    assert_eq!(server.mock.forecast_hits(), 1);

    server.stop().await
}

#[tokio::test]
async fn unknown_city_is_a_normal_result_without_forecast_call() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client.call_weather(UNKNOWN_CITY, Units::Metric).await?;
    assert!(!output.is_error);
    assert_eq!(output.text, no_match_message(UNKNOWN_CITY));
    assert!(output.text.contains(UNKNOWN_CITY));
    assert!(output.resource_uri.is_none());
    assert_eq!(server.mock.geocoding_hits(), 1);
    assert_eq!(server.mock.forecast_hits(), 0);

    server.stop().await
}

#[tokio::test]
async fn upstream_failures_become_tool_errors() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client
        .call_weather(FORECAST_FAILURE_CITY, Units::Metric)
        .await?;
    assert!(output.is_error);
    assert_eq!(output.text, "Forecast failed: HTTP 502");

    let output = client
        .call_weather(GEOCODING_FAILURE_CITY, Units::Metric)
        .await?;
    assert!(output.is_error);
    assert_eq!(output.text, "Geocoding lookup failed: HTTP 503");
    assert_eq!(server.mock.forecast_hits(), 1);

    // The session survives tool errors.
    let output = client.call_weather("Paris", Units::Metric).await?;
    assert!(!output.is_error);

    server.stop().await
}

#[tokio::test]
async fn empty_hourly_arrays_leave_only_the_current_line() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let output = client.call_weather(NO_HOURLY_CITY, Units::Metric).await?;
    assert!(!output.is_error);
    assert_eq!(
        output.text,
        "Weather for Stillwater (lat 11.11, lon 22.22)\nNow: 18.4°C, wind 12 km/h, precipitation 0 mm"
    );

    server.stop().await
}

#[tokio::test]
async fn short_city_is_rejected_as_invalid_params() -> Result<()> {
    let server = TestServer::start(true).await?;
    let mut client = connected(&server).await?;

    let err = client
        .call_weather(" X ", Units::Metric)
        .await
        .expect_err("one-character city must fail validation");
    match err {
        ClientError::Rpc { code, .. } => assert_eq!(code, -32602),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.mock.geocoding_hits(), 0);

    server.stop().await
}
