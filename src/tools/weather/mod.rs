//! `weather_by_city`: geocode a city, fetch its forecast, and format the result.

pub mod provider;
pub mod report;
pub mod request;

use rmcp::model::{CallToolResult, Content, ErrorData};
use serde_json::json;
use tracing::{info, warn, Instrument};

use crate::lib::{
    errors::{ToolErrorDescriptor, WeatherError},
    telemetry::ToolCallSpan,
};

pub use provider::{OpenMeteoClient, Place};
pub use report::{no_match_message, CurrentConditions, HourlyEntry, WeatherReport};
pub use request::{Units, WeatherQuery, WeatherQueryValidationError, MIN_CITY_LEN};

pub const WEATHER_TOOL_ID: &str = "weather_by_city";

const INVALID_QUERY_ERROR: ToolErrorDescriptor = ToolErrorDescriptor::new(
    "invalid_weather_query",
    "The weather_by_city arguments are invalid",
    "Pass a city name of at least 2 characters and units of `metric` or `imperial`.",
    false,
);

/// Result of a lookup that reached the provider.
#[derive(Debug, Clone)]
pub enum WeatherOutcome {
    /// Geocoding returned no results; not an error.
    NoMatch { city: String },
    Report(WeatherReport),
}

impl WeatherOutcome {
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self {
            WeatherOutcome::NoMatch { city } => {
                CallToolResult::success(vec![Content::text(no_match_message(&city))])
            }
            WeatherOutcome::Report(report) => report.into_call_tool_result(),
        }
    }
}

/// Geocode, then forecast. The forecast is requested only once a place is known.
pub async fn lookup(
    client: &OpenMeteoClient,
    query: &WeatherQuery,
) -> Result<WeatherOutcome, WeatherError> {
    let city = query.city();
    let Some(mut place) = client.geocode(city).await? else {
        info!(
            target: "weather_mcp::weather",
            city,
            "Geocoding returned no match"
        );
        return Ok(WeatherOutcome::NoMatch {
            city: city.to_string(),
        });
    };

    if place.name.is_empty() {
        place.name = city.to_string();
    }

    let forecast_url = client.forecast_query_url(&place, query.units);
    let body = client.forecast(&forecast_url).await?;
    Ok(WeatherOutcome::Report(WeatherReport::from_forecast(
        place,
        query.units,
        forecast_url,
        &body,
    )))
}

/// Validate and run one tool call, mapping provider failures to a tool-error result.
pub async fn run_tool_call(
    client: &OpenMeteoClient,
    query: WeatherQuery,
) -> Result<CallToolResult, ErrorData> {
    if let Err(err) = query.validate() {
        return Err(validation_error_to_error_data(err, &query));
    }

    let span = ToolCallSpan::start(WEATHER_TOOL_ID, query.city(), query.units.as_str());
    match lookup(client, &query).instrument(span.span().clone()).await {
        Ok(outcome) => {
            let label = match &outcome {
                WeatherOutcome::NoMatch { .. } => "no_match",
                WeatherOutcome::Report(_) => "succeeded",
            };
            span.finish(label);
            Ok(outcome.into_call_tool_result())
        }
        Err(err) => {
            warn!(
                target: "weather_mcp::weather",
                city = query.city(),
                error = %err,
                "Weather lookup failed"
            );
            span.finish("failed");
            Ok(lookup_error_to_tool_result(&err))
        }
    }
}

pub fn validation_error_to_error_data(
    err: WeatherQueryValidationError,
    query: &WeatherQuery,
) -> ErrorData {
    INVALID_QUERY_ERROR.invalid_params(
        json!({ "reason": err.to_string() }),
        [("city", json!(query.city))],
    )
}

/// Upstream failures become `isError: true` results so the caller sees the message.
pub fn lookup_error_to_tool_result(err: &WeatherError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}
