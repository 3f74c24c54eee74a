use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::model::celsius_to_kelvin;

use super::{ProviderId, TemperatureProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// WeatherAPI.com source. Reports Celsius, converted to Kelvin on the way out.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch_current(&self, city: &str) -> Result<f64> {
        let url = format!("{}/v1/current.json", self.base_url);
        debug!(provider = %ProviderId::WeatherApi, %city, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await
            .context("Failed to send request to WeatherAPI.com (current)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read WeatherAPI current response body")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "WeatherAPI current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        parse_kelvin(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

fn parse_kelvin(body: &str) -> Result<f64> {
    let parsed: WaResponse =
        serde_json::from_str(body).context("Failed to parse WeatherAPI current JSON")?;
    Ok(celsius_to_kelvin(parsed.current.temp_c))
}

#[async_trait]
impl TemperatureProvider for WeatherApiProvider {
    fn name(&self) -> &str {
        ProviderId::WeatherApi.as_str()
    }

    async fn temperature(&self, city: &str) -> Result<f64> {
        let kelvin = self.fetch_current(city).await?;
        info!(provider = self.name(), %city, kelvin, "temperature reading");
        Ok(kelvin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub;

    #[test]
    fn converts_celsius_reading_to_kelvin() {
        let body = r#"{
            "location": {"name": "Tokyo", "country": "Japan"},
            "current": {"temp_c": 20.0, "feelslike_c": 19.0, "humidity": 60}
        }"#;

        let kelvin = parse_kelvin(body).unwrap();
        assert!((kelvin - 293.15).abs() < 1e-9);
    }

    #[test]
    fn error_payload_is_decode_error() {
        let body = r#"{"error": {"code": 1006, "message": "No matching location found."}}"#;
        let err = parse_kelvin(body).unwrap_err();

        assert!(err.to_string().contains("Failed to parse WeatherAPI"));
    }

    #[test]
    fn reports_its_name() {
        let p = WeatherApiProvider::new("K".into(), None);
        assert_eq!(p.name(), "weatherapi");
        assert_eq!(p.base_url, "https://api.weatherapi.com");
    }

    #[tokio::test]
    async fn fetches_celsius_with_key_and_city_query() {
        let (base_url, request) =
            stub::serve_once("200 OK", r#"{"current": {"temp_c": 20.0}}"#).await;
        let p = WeatherApiProvider::new("SECRET".into(), Some(&base_url));

        let kelvin = p.temperature("new york").await.unwrap();

        assert!((kelvin - 293.15).abs() < 1e-9, "got {kelvin}");
        let line = request.await.unwrap();
        assert!(line.starts_with("GET /v1/current.json?key=SECRET&q=new+york "), "{line}");
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_truncated_body() {
        let long_body: &'static str = Box::leak("x".repeat(300).into_boxed_str());
        let (base_url, _request) = stub::serve_once("503 Service Unavailable", long_body).await;
        let p = WeatherApiProvider::new("K".into(), Some(&base_url));

        let msg = p.temperature("tokyo").await.unwrap_err().to_string();

        assert!(
            msg.starts_with("WeatherAPI current request failed with status 503 Service Unavailable: "),
            "{msg}"
        );
        assert!(msg.ends_with(&format!("{}...", "x".repeat(200))), "{msg}");
    }
}
