use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use tracing::info;
use weather_core::{Aggregator, Config, ProviderId, kelvin_to_celsius, providers_from_config};

use crate::server::{self, AppState};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Multi-provider temperature service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Serve `GET /weather/{city}` over HTTP.
    Serve {
        /// Listen address; overrides the config file and WEATHER_LISTEN.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Query all configured providers once and print the mean temperature.
    Show {
        /// City name passed to every provider.
        city: String,
    },

    /// List known providers and whether they are configured.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Serve { listen } => {
                let config = Config::load_with_env()?;
                let aggregator = build_aggregator(&config)?;
                let listen = listen.unwrap_or_else(|| config.server.listen.clone());

                server::serve(&listen, AppState { aggregator }).await
            }
            Command::Show { city } => {
                let config = Config::load_with_env()?;
                let aggregator = build_aggregator(&config)?;

                let kelvin = aggregator.temperature(&city).await?;
                println!("{city}: {kelvin:.2} K ({:.1} °C)", kelvin_to_celsius(kelvin));
                Ok(())
            }
            Command::Providers => {
                let config = Config::load_with_env()?;
                for id in ProviderId::all() {
                    let state =
                        if config.is_provider_configured(*id) { "configured" } else { "missing" };
                    println!("{id:<12} {state:<11} ({})", id.env_var());
                }
                Ok(())
            }
        }
    }
}

fn build_aggregator(config: &Config) -> anyhow::Result<Aggregator> {
    let aggregator = Aggregator::new(providers_from_config(config)?);
    info!(providers = ?aggregator.provider_names(), "aggregator ready");
    Ok(aggregator)
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_listen() {
        let cli = Cli::try_parse_from(["weather", "serve", "--listen", "127.0.0.1:3000"]).unwrap();

        match cli.command {
            Command::Serve { listen } => assert_eq!(listen.as_deref(), Some("127.0.0.1:3000")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_city() {
        assert!(Cli::try_parse_from(["weather", "show"]).is_err());
    }

    #[test]
    fn build_aggregator_fails_without_credentials() {
        let err = build_aggregator(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No providers configured"));
    }

    #[test]
    fn build_aggregator_uses_every_configured_provider() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::OpenWeather, "A".into());
        config.upsert_provider_api_key(ProviderId::WeatherApi, "B".into());

        let aggregator = build_aggregator(&config).unwrap();
        assert_eq!(aggregator.len(), 2);
    }
}
