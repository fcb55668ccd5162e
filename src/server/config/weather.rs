use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Upstream weather provider settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub geocoding_url: Url,
    pub forecast_url: Url,
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: Url::parse(DEFAULT_GEOCODING_URL).expect("default geocoding URL"),
            forecast_url: Url::parse(DEFAULT_FORECAST_URL).expect("default forecast URL"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawWeatherConfig {
    pub geocoding_url: Option<String>,
    pub forecast_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

pub fn parse_weather_section(
    raw: Option<RawWeatherConfig>,
    path: &Path,
) -> Result<WeatherConfig, ConfigError> {
    let weather_raw = raw.unwrap_or_default();

    let geocoding_url = parse_endpoint(
        weather_raw.geocoding_url.as_deref(),
        DEFAULT_GEOCODING_URL,
        "weather.geocoding_url",
        path,
    )?;
    let forecast_url = parse_endpoint(
        weather_raw.forecast_url.as_deref(),
        DEFAULT_FORECAST_URL,
        "weather.forecast_url",
        path,
    )?;

    let request_timeout_secs = weather_raw
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&request_timeout_secs) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "weather.request_timeout_secs",
            message: format!("Use a value in the range 1-{MAX_REQUEST_TIMEOUT_SECS}"),
        });
    }

    Ok(WeatherConfig {
        geocoding_url,
        forecast_url,
        request_timeout_secs,
    })
}

fn parse_endpoint(
    value: Option<&str>,
    default: &str,
    field: &'static str,
    path: &Path,
) -> Result<Url, ConfigError> {
    let raw = value.map(str::trim).unwrap_or(default);
    if raw.is_empty() {
        return Err(ConfigError::MissingField {
            path: path.to_path_buf(),
            field,
        });
    }
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: format!("`{raw}` is not a valid URL: {err}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field,
            message: format!("`{raw}` must use http or https"),
        });
    }
    Ok(url)
}
