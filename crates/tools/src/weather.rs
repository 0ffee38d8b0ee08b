//! Weather lookup tool backed by OpenWeatherMap.
//!
//! The tool queries the 5-day forecast endpoint and reports the
//! temperature closest to midday on the requested date. Input format is
//! not validated locally; a bad date simply finds no forecast slot and
//! comes back as an error payload.

use async_trait::async_trait;
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures a forecast backend can report.
#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    /// The provider has no forecaster for this place.
    #[error("Location not found")]
    LocationNotFound,

    /// Anything else: network trouble, bad key, no slot for the date.
    #[error("{0}")]
    Unavailable(String),
}

/// A source of daily temperature forecasts.
///
/// Production uses [`OwmClient`]; tests substitute a canned fake.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Temperature (°C) for `location` on `date` (`YYYY-MM-DD`).
    async fn temperature_at(&self, location: &str, date: &str) -> Result<f64, ForecastError>;
}

/// OpenWeatherMap forecast client.
pub struct OwmClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OwmClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ForecastError> {
        Self::with_base_url(api_key, "https://api.openweathermap.org/data/2.5")
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ForecastError::Unavailable(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmSlot>,
}

#[derive(Debug, Deserialize)]
struct OwmSlot {
    /// "YYYY-MM-DD HH:MM:SS"
    dt_txt: String,
    main: OwmMain,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

/// Pick the slot closest to midday on `date`. Returns None when the date
/// is outside the forecast window.
fn midday_temperature(slots: &[OwmSlot], date: &str) -> Option<f64> {
    slots
        .iter()
        .filter(|s| s.dt_txt.starts_with(date))
        .min_by_key(|s| {
            let hour: i32 = s
                .dt_txt
                .get(11..13)
                .and_then(|h| h.parse().ok())
                .unwrap_or(0);
            (hour - 12).abs()
        })
        .map(|s| s.main.temp)
}

#[async_trait]
impl ForecastSource for OwmClient {
    async fn temperature_at(&self, location: &str, date: &str) -> Result<f64, ForecastError> {
        let url = format!("{}/forecast", self.base_url);
        debug!(%location, %date, "Requesting OWM forecast");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Unavailable(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(ForecastError::LocationNotFound);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::Unavailable(format!(
                "forecast request failed with status {status}: {body}"
            )));
        }

        let forecast: OwmForecastResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::Unavailable(e.to_string()))?;

        midday_temperature(&forecast.list, date).ok_or_else(|| {
            ForecastError::Unavailable(format!("no forecast available for {date}"))
        })
    }
}

/// The `get_weather_for_location_and_date` tool.
pub struct WeatherTool {
    source: Arc<dyn ForecastSource>,
}

impl WeatherTool {
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather_for_location_and_date"
    }

    fn description(&self) -> &str {
        "Get the weather in a given location. The location must be a city and the date must be given in the format \"YYYY-MM-DD\"."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city to look up weather for"
                },
                "date": {
                    "type": "string",
                    "description": "The date, in the format YYYY-MM-DD"
                }
            },
            "required": ["location", "date"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;
        let date = arguments["date"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date' argument".into()))?;

        println!("Fetching forecast for {location} at {date} ☀️");

        let (success, output) = match self.source.temperature_at(location, date).await {
            Ok(temperature) => (
                true,
                serde_json::json!({
                    "location": location,
                    "temperature": temperature,
                    "date": date,
                })
                .to_string(),
            ),
            Err(e) => (false, serde_json::json!({ "error": e.to_string() }).to_string()),
        };

        Ok(ToolResult {
            call_id: String::new(),
            success,
            output,
            agent: None,
        })
    }
}
