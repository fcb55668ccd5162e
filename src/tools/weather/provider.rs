use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::{lib::errors::WeatherError, server::config::WeatherConfig};

use super::Units;

const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m,precipitation";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability";

/// Location resolved by the geocoding endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub admin1: Option<String>,
    pub country_code: Option<String>,
}

impl Place {
    /// Read one geocoding result. Only numeric coordinates are required;
    /// missing or mistyped name parts are dropped.
    pub fn from_result(result: &Value) -> Option<Self> {
        let text = |key: &str| {
            result
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            name: text("name").unwrap_or_default(),
            latitude: result.get("latitude").and_then(Value::as_f64)?,
            longitude: result.get("longitude").and_then(Value::as_f64)?,
            admin1: text("admin1"),
            country_code: text("country_code"),
        })
    }

    /// "City, Region, CC" with absent parts skipped.
    pub fn label(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// HTTP client for the Open-Meteo geocoding and forecast endpoints.
#[derive(Clone, Debug)]
pub struct OpenMeteoClient {
    http: Client,
    geocoding_url: Url,
    forecast_url: Url,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("weather-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| WeatherError::Client { source })?;
        Ok(Self {
            http,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
        })
    }

    pub fn geocoding_query_url(&self, city: &str) -> Url {
        let mut url = self.geocoding_url.clone();
        url.query_pairs_mut()
            .append_pair("name", city)
            .append_pair("count", "1")
            .append_pair("language", "en")
            .append_pair("format", "json");
        url
    }

    /// Exact forecast query for `place`; also handed back to callers as a resource link.
    pub fn forecast_query_url(&self, place: &Place, units: Units) -> Url {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &place.latitude.to_string())
            .append_pair("longitude", &place.longitude.to_string())
            .append_pair("current", CURRENT_FIELDS)
            .append_pair("hourly", HOURLY_FIELDS)
            .append_pair("temperature_unit", units.temperature_unit())
            .append_pair("wind_speed_unit", units.wind_speed_unit())
            .append_pair("forecast_days", "1")
            .append_pair("timezone", "auto");
        url
    }

    /// Resolve a city to its best match; `Ok(None)` when nothing matched.
    pub async fn geocode(&self, city: &str) -> Result<Option<Place>, WeatherError> {
        let url = self.geocoding_query_url(city);
        debug!(target: "weather_mcp::weather", %url, "Requesting geocoding");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| WeatherError::Request {
                stage: "Geocoding",
                source,
            })?;
        if !response.status().is_success() {
            return Err(WeatherError::GeocodingStatus {
                status: response.status().as_u16(),
            });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|source| WeatherError::Decode {
                stage: "Geocoding",
                source,
            })?;
        let Some(first) = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
        else {
            return Ok(None);
        };
        Place::from_result(first)
            .map(Some)
            .ok_or(WeatherError::MissingCoordinates)
    }

    /// Fetch the forecast body. Field-level problems are left to the formatter.
    pub async fn forecast(&self, url: &Url) -> Result<Value, WeatherError> {
        debug!(target: "weather_mcp::weather", %url, "Requesting forecast");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| WeatherError::Request {
                stage: "Forecast",
                source,
            })?;
        if !response.status().is_success() {
            return Err(WeatherError::ForecastStatus {
                status: response.status().as_u16(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| WeatherError::Decode {
                stage: "Forecast",
                source,
            })
    }
}
