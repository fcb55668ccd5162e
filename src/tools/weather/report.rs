//! Formatting of forecast bodies into the text summary and resource link.
use chrono::NaiveDateTime;
use reqwest::Url;
use rmcp::model::{AnnotateAble, CallToolResult, Content, RawContent, RawResource};
use serde_json::Value;

use super::{Place, Units};

pub const MAX_HOURLY_ENTRIES: usize = 6;
const PLACEHOLDER: &str = "n/a";
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEntry {
    pub time: String,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<f64>,
}

/// Successful lookup, ready to render.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub place: Place,
    pub units: Units,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub forecast_url: Url,
}

impl WeatherReport {
    /// Build a report from a raw forecast body; absent or mistyped fields become `None`.
    pub fn from_forecast(place: Place, units: Units, forecast_url: Url, body: &Value) -> Self {
        Self {
            place,
            units,
            current: current_conditions(body),
            hourly: hourly_entries(body),
            forecast_url,
        }
    }

    pub fn summary(&self) -> String {
        let temperature_label = self.units.temperature_label();
        let mut lines = vec![
            format!(
                "Weather for {} (lat {:.2}, lon {:.2})",
                self.place.label(),
                self.place.latitude,
                self.place.longitude
            ),
            format!(
                "Now: {}, wind {}, precipitation {}",
                with_unit(self.current.temperature, temperature_label, ""),
                with_unit(self.current.wind_speed, self.units.wind_speed_label(), " "),
                with_unit(self.current.precipitation, "mm", " "),
            ),
        ];

        if !self.hourly.is_empty() {
            lines.push("Next hours:".to_string());
            for entry in &self.hourly {
                lines.push(format!(
                    "- {}: {}, precipitation {}",
                    time_of_day(&entry.time),
                    with_unit(entry.temperature, temperature_label, ""),
                    with_unit(entry.precipitation_probability, "%", ""),
                ));
            }
        }

        lines.join("\n")
    }

    pub fn resource_link(&self) -> RawResource {
        let mut resource = RawResource::new(self.forecast_url.to_string(), "open-meteo-forecast");
        resource.mime_type = Some("application/json".to_string());
        resource.description = Some(format!(
            "Raw Open-Meteo forecast JSON ({}) for {}",
            self.units.as_str(),
            self.place.label()
        ));
        resource
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        let link = RawContent::ResourceLink(self.resource_link()).no_annotation();
        CallToolResult::success(vec![Content::text(self.summary()), link])
    }
}

/// Guidance returned (as a normal result) when geocoding finds nothing.
pub fn no_match_message(city: &str) -> String {
    format!(
        "No location found for \"{city}\". Try a more specific name or add a state or country qualifier, e.g. \"{city}, <country>\"."
    )
}

fn current_conditions(body: &Value) -> CurrentConditions {
    let current = body.get("current");
    let legacy = body.get("current_weather");
    CurrentConditions {
        temperature: number_at(current, "temperature_2m")
            .or_else(|| number_at(legacy, "temperature")),
        wind_speed: number_at(current, "wind_speed_10m")
            .or_else(|| number_at(legacy, "windspeed")),
        precipitation: number_at(current, "precipitation")
            .or_else(|| number_at(legacy, "precipitation")),
    }
}

fn hourly_entries(body: &Value) -> Vec<HourlyEntry> {
    let hourly = body.get("hourly");
    let Some(times) = hourly
        .and_then(|value| value.get("time"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    let temperatures = array_at(hourly, "temperature_2m");
    let probabilities = array_at(hourly, "precipitation_probability");

    let now = body
        .get("current")
        .and_then(|value| value.get("time"))
        .and_then(Value::as_str);
    let start = now
        .and_then(|now| {
            times
                .iter()
                .position(|time| time.as_str().is_some_and(|time| time >= now))
        })
        .unwrap_or(0);

    times
        .iter()
        .enumerate()
        .skip(start)
        .take(MAX_HOURLY_ENTRIES)
        .map(|(index, time)| HourlyEntry {
            time: time.as_str().unwrap_or(PLACEHOLDER).to_string(),
            temperature: temperatures
                .and_then(|values| values.get(index))
                .and_then(Value::as_f64),
            precipitation_probability: probabilities
                .and_then(|values| values.get(index))
                .and_then(Value::as_f64),
        })
        .collect()
}

fn number_at(section: Option<&Value>, key: &str) -> Option<f64> {
    section.and_then(|value| value.get(key)).and_then(Value::as_f64)
}

fn array_at<'a>(section: Option<&'a Value>, key: &str) -> Option<&'a Vec<Value>> {
    section
        .and_then(|value| value.get(key))
        .and_then(Value::as_array)
}

fn with_unit(value: Option<f64>, unit: &str, separator: &str) -> String {
    match value {
        Some(value) => format!("{value}{separator}{unit}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Local `HH:MM` from an Open-Meteo timestamp; unparsable input is shown as-is.
fn time_of_day(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, HOURLY_TIME_FORMAT)
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
