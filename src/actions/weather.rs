//! Current weather from OpenWeather

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ActionHandler, Invocation};
use crate::assistant::Assistant;
use crate::{Error, Result};

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
}

/// Speaks the current temperature and conditions for the configured city
#[derive(Debug, Clone)]
pub struct WeatherHandler {
    client: reqwest::Client,
}

impl WeatherHandler {
    /// Create a handler with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client })
    }

    async fn current(&self, api_key: &str, city: &str) -> Result<WeatherResponse> {
        let response = self
            .client
            .get(WEATHER_URL)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Action(format!("weather API returned {status}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ActionHandler for WeatherHandler {
    async fn run(&self, assistant: &Assistant, _invocation: Invocation<'_>) -> Result<()> {
        let config = assistant.config();
        let (Some(api_key), Some(city)) = (&config.api_keys.openweather, &config.weather_city)
        else {
            assistant.speak("Weather is not configured.").await;
            return Ok(());
        };

        let reply = match self.current(api_key, city).await {
            Ok(weather) => weather_phrase(&weather),
            Err(e) => {
                tracing::warn!(error = %e, city = %city, "weather lookup failed");
                "Unable to retrieve weather data.".to_string()
            }
        };
        assistant.speak(&reply).await;
        Ok(())
    }
}

fn weather_phrase(weather: &WeatherResponse) -> String {
    let description = weather
        .weather
        .first()
        .map_or("unknown conditions", |c| c.description.as_str());
    format!(
        "The current temperature is {:.0} degrees with {description}.",
        weather.main.temp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_phrase() {
        let weather: WeatherResponse = serde_json::from_str(
            r#"{"cod": 200, "main": {"temp": 18.6}, "weather": [{"description": "light rain"}]}"#,
        )
        .unwrap();
        assert_eq!(
            weather_phrase(&weather),
            "The current temperature is 19 degrees with light rain."
        );
    }
}
