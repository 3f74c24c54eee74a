use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ProviderId, TemperatureProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather current-weather source. Without a `units` parameter the API
/// reports Kelvin, so readings are passed through unchanged.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<f64> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        debug!(provider = %ProviderId::OpenWeather, %city, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        parse_kelvin(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

fn parse_kelvin(body: &str) -> Result<f64> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;
    Ok(parsed.main.temp)
}

#[async_trait]
impl TemperatureProvider for OpenWeatherProvider {
    fn name(&self) -> &str {
        ProviderId::OpenWeather.as_str()
    }

    async fn temperature(&self, city: &str) -> Result<f64> {
        let kelvin = self.fetch_current(city).await?;
        info!(provider = self.name(), %city, kelvin, "temperature reading");
        Ok(kelvin)
    }
}
