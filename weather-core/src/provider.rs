use crate::{
    Config,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Environment variable carrying this provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// A single upstream source of temperature readings.
///
/// Implementations report in Kelvin; any unit conversion happens inside the
/// adapter before the value is returned.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn temperature(&self, city: &str) -> anyhow::Result<f64>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn TemperatureProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` or set {}.",
            id.env_var()
        )
    })?;
    let base_url = config.provider_base_url(id);

    let provider: Arc<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeather => {
            Arc::new(OpenWeatherProvider::new(api_key.to_owned(), base_url))
        }
        ProviderId::WeatherApi => Arc::new(WeatherApiProvider::new(api_key.to_owned(), base_url)),
    };

    Ok(provider)
}

/// Construct every provider that has credentials, in [`ProviderId::all`] order.
pub fn providers_from_config(
    config: &Config,
) -> anyhow::Result<Vec<Arc<dyn TemperatureProvider>>> {
    let ids = config.configured_providers();
    if ids.is_empty() {
        return Err(anyhow::anyhow!(
            "No providers configured.\n\
             Hint: run `weather configure <provider>` or set one of: {}.",
            ProviderId::all().iter().map(|id| id.env_var()).collect::<Vec<_>>().join(", ")
        ));
    }

    ids.into_iter().map(|id| provider_from_config(id, config)).collect()
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
