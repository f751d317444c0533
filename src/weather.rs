//! Weather collaborator: current conditions as one spoken sentence.
//!
//! Backed by the OpenWeatherMap current-weather endpoint. Never fails:
//! every problem becomes one of two fixed sentences.

use crate::config::WeatherConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Reply used when no HTTP client could be built or the call failed.
pub const FETCH_FAILED: &str = "Something went wrong while fetching the weather.";

/// Looks up the weather for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// A natural-language sentence (or a fixed failure sentence).
    async fn describe(&self, city: &str) -> String;
}

/// Reply used when the service does not know the city.
#[must_use]
pub fn unknown_city(city: &str) -> String {
    format!("Sorry, I couldn't get the weather for {city}.")
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    /// OpenWeatherMap returns this as a number on success and a string on errors.
    cod: serde_json::Value,
    #[serde(default)]
    weather: Vec<Condition>,
    main: Option<MainReadings>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

impl WeatherResponse {
    fn is_ok(&self) -> bool {
        match &self.cod {
            serde_json::Value::Number(n) => n.as_u64() == Some(200),
            serde_json::Value::String(s) => s == "200",
            _ => false,
        }
    }

    fn sentence(&self, city: &str) -> Option<String> {
        let desc = crate::profile::capitalize(&self.weather.first()?.description);
        let main = self.main.as_ref()?;
        let wind = self.wind.as_ref()?;
        Some(format!(
            "The weather in {city} is {desc} with {} degrees Celsius, humidity at {} percent, \
             and wind speed of {} meters per second.",
            main.temp, main.humidity, wind.speed
        ))
    }
}

/// OpenWeatherMap client.
#[derive(Debug)]
pub struct OpenWeatherClient {
    client: Option<reqwest::Client>,
    url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client. A client that cannot be built answers every request
    /// with [`FETCH_FAILED`].
    #[must_use]
    pub fn new(config: &WeatherConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| warn!("weather HTTP client unavailable: {e}"))
            .ok();
        Self {
            client,
            url: config.api_url.clone(),
            api_key: api_key.unwrap_or_default(),
        }
    }

    async fn fetch(&self, city: &str) -> Result<WeatherResponse, String> {
        let client = self.client.as_ref().ok_or("no HTTP client")?;
        let url = format!(
            "{}?q={}&appid={}&units=metric",
            self.url,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        );
        let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
        response
            .json::<WeatherResponse>()
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn describe(&self, city: &str) -> String {
        match self.fetch(city).await {
            Ok(data) if !data.is_ok() => unknown_city(city),
            Ok(data) => data.sentence(city).unwrap_or_else(|| {
                warn!("weather response for {city} is missing fields");
                FETCH_FAILED.to_owned()
            }),
            Err(e) => {
                warn!("weather request for {city} failed: {e}");
                FETCH_FAILED.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn sentence_from_full_response() {
        let data: WeatherResponse = serde_json::from_str(
            r#"{"cod": 200, "weather": [{"description": "light rain"}],
                "main": {"temp": 27.5, "humidity": 80}, "wind": {"speed": 3.1}}"#,
        )
        .unwrap();
        assert!(data.is_ok());
        assert_eq!(
            data.sentence("Mumbai").unwrap(),
            "The weather in Mumbai is Light rain with 27.5 degrees Celsius, humidity at 80 \
             percent, and wind speed of 3.1 meters per second."
        );
    }

    #[test]
    fn string_error_code_is_not_ok() {
        let data: WeatherResponse =
            serde_json::from_str(r#"{"cod": "404", "message": "city not found"}"#).unwrap();
        assert!(!data.is_ok());
        assert!(data.sentence("Atlantis").is_none());
    }

    #[test]
    fn unknown_city_sentence() {
        assert_eq!(
            unknown_city("Atlantis"),
            "Sorry, I couldn't get the weather for Atlantis."
        );
    }
}
