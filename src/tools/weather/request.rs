use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_CITY_LEN: usize = 2;

/// Unit system for temperatures and wind speed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Value for Open-Meteo's `temperature_unit` parameter.
    pub fn temperature_unit(&self) -> &'static str {
        match self {
            Units::Metric => "celsius",
            Units::Imperial => "fahrenheit",
        }
    }

    /// Value for Open-Meteo's `wind_speed_unit` parameter.
    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "kmh",
            Units::Imperial => "mph",
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }
}

/// Input for `weather_by_city`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeatherQuery {
    /// City name, optionally qualified with a region or country (e.g. "Springfield, IL").
    #[schemars(length(min = 2))]
    pub city: String,
    /// Unit system for the report.
    #[serde(default)]
    pub units: Units,
}

impl WeatherQuery {
    /// Validate the input before any upstream call is made.
    pub fn validate(&self) -> Result<(), WeatherQueryValidationError> {
        let length = self.city.trim().chars().count();
        if length < MIN_CITY_LEN {
            return Err(WeatherQueryValidationError::CityTooShort { length });
        }
        Ok(())
    }

    /// City name as sent upstream.
    pub fn city(&self) -> &str {
        self.city.trim()
    }
}

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeatherQueryValidationError {
    #[error("city must be at least {MIN_CITY_LEN} characters (got {length})")]
    CityTooShort { length: usize },
}
