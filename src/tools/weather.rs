//! OpenWeatherMap current-weather collaborator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{ToolKind, ToolResult};
use crate::tools::Tool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherData {
    pub city: String,
    pub country: String,
    pub temperature_celsius: f64,
    pub temperature_fahrenheit: f64,
    pub feels_like_celsius: f64,
    pub humidity: u64,
    pub description: String,
    pub wind_speed_mps: f64,
    pub visibility_km: f64,
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    city: String,
    #[serde(default)]
    country_code: Option<String>,
}

pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherTool {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.openweathermap_api_base.clone(),
            api_key: settings.openweathermap_api_key.clone(),
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let request = self
            .http
            .get(format!("{}{endpoint}", self.base_url))
            .query(params)
            .query(&[("appid", self.api_key.as_str())]);
        Ok(request.send().await?)
    }

    fn status_error(status: reqwest::StatusCode, city: &str) -> String {
        match status.as_u16() {
            404 => format!("City not found: {city}"),
            401 => "Invalid API key".to_string(),
            code => format!("Weather API error: {code}"),
        }
    }

    fn map_current(data: &Value, requested_city: &str) -> WeatherData {
        let main = &data["main"];
        let weather = &data["weather"][0];
        let temp_celsius = main["temp"].as_f64().unwrap_or(0.0);

        WeatherData {
            city: data["name"]
                .as_str()
                .unwrap_or(requested_city)
                .to_string(),
            country: data["sys"]["country"].as_str().unwrap_or_default().to_string(),
            temperature_celsius: round1(temp_celsius),
            temperature_fahrenheit: round1(temp_celsius * 9.0 / 5.0 + 32.0),
            feels_like_celsius: round1(main["feels_like"].as_f64().unwrap_or(0.0)),
            humidity: main["humidity"].as_u64().unwrap_or(0),
            description: capitalize(weather["description"].as_str().unwrap_or_default()),
            wind_speed_mps: data["wind"]["speed"].as_f64().unwrap_or(0.0),
            visibility_km: round1(data["visibility"].as_f64().unwrap_or(0.0) / 1000.0),
        }
    }

    /// Fetches a three-hourly forecast, up to `days` days (1-5).
    pub async fn forecast(&self, city: &str, country_code: Option<&str>, days: u32) -> ToolResult {
        let query = match country_code {
            Some(code) => format!("{city},{code}"),
            None => city.to_string(),
        };
        let count = (days * 8).min(40);

        let response = match self
            .get(
                "/forecast",
                &[
                    ("q", query),
                    ("units", "metric".to_string()),
                    ("cnt", count.to_string()),
                ],
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return ToolResult::err(ToolKind::Weather, e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return ToolResult::err(ToolKind::Weather, Self::status_error(status, city));
        }

        match response.json::<Value>().await {
            Ok(data) => {
                let forecasts: Vec<Value> = data["list"]
                    .as_array()
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|entry| {
                                json!({
                                    "datetime": entry["dt_txt"],
                                    "temperature_celsius": entry["main"]["temp"],
                                    "description": entry["weather"][0]["description"],
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                ToolResult::ok(
                    ToolKind::Weather,
                    json!({
                        "city": data["city"]["name"].as_str().unwrap_or(city),
                        "forecasts": forecasts,
                    }),
                )
            }
            Err(e) => ToolResult::err(ToolKind::Weather, e.to_string()),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Weather
    }

    fn name(&self) -> &str {
        "Weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a city"
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let params: LookupParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Tool(format!("invalid weather parameters: {e}")))?;

        let query = match &params.country_code {
            Some(code) => format!("{},{code}", params.city),
            None => params.city.clone(),
        };

        info!("Fetching weather for: {query}");
        let response = self
            .get("/weather", &[("q", query), ("units", "metric".to_string())])
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::status_error(status, &params.city);
            error!("{message}");
            return Ok(ToolResult::err(ToolKind::Weather, message));
        }

        let data: Value = response.json().await?;
        let weather = Self::map_current(&data, &params.city);
        Ok(ToolResult::ok(
            ToolKind::Weather,
            serde_json::to_value(&weather)?,
        ))
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_current_weather_payload() {
        let data = json!({
            "name": "London",
            "sys": {"country": "GB"},
            "main": {"temp": 15.52, "feels_like": 14.87, "humidity": 72},
            "weather": [{"description": "light rain"}],
            "wind": {"speed": 4.1},
            "visibility": 9400,
        });

        let weather = WeatherTool::map_current(&data, "London");
        assert_eq!(weather.city, "London");
        assert_eq!(weather.country, "GB");
        assert_eq!(weather.temperature_celsius, 15.5);
        assert_eq!(weather.temperature_fahrenheit, 59.9);
        assert_eq!(weather.feels_like_celsius, 14.9);
        assert_eq!(weather.humidity, 72);
        assert_eq!(weather.description, "Light rain");
        assert_eq!(weather.visibility_km, 9.4);
    }

    #[test]
    fn status_errors_distinguish_not_found_and_bad_key() {
        assert_eq!(
            WeatherTool::status_error(reqwest::StatusCode::NOT_FOUND, "Atlantis"),
            "City not found: Atlantis"
        );
        assert_eq!(
            WeatherTool::status_error(reqwest::StatusCode::UNAUTHORIZED, "London"),
            "Invalid API key"
        );
    }

    #[test]
    fn lookup_params_require_city() {
        assert!(serde_json::from_value::<LookupParams>(json!({})).is_err());
        let params: LookupParams =
            serde_json::from_value(json!({"city": "Tokyo", "country_code": "JP"})).unwrap();
        assert_eq!(params.country_code.as_deref(), Some("JP"));
    }
}
