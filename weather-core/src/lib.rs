//! Core library for the `weather` temperature service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The provider abstraction and its upstream adapters
//! - The aggregator that queries every provider concurrently and averages the result
//! - Shared domain models (unit conversion, response body)
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod model;
pub mod provider;

pub use aggregate::{AggregateError, Aggregator};
pub use config::{Config, ProviderConfig, ServerConfig};
pub use model::{TemperatureReport, celsius_to_kelvin, kelvin_to_celsius};
pub use provider::{ProviderId, TemperatureProvider, providers_from_config};
