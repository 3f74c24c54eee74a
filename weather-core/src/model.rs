use serde::Serialize;
use std::time::Duration;

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert a Celsius reading into Kelvin, the unit all providers report in.
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Body of a successful `/weather/{city}` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReport {
    pub city: String,
    /// Mean of all provider readings, in Kelvin.
    pub temp: f64,
    /// Processing time, e.g. `"1.52ms"`.
    pub took: String,
}

impl TemperatureReport {
    pub fn new(city: impl Into<String>, temp: f64, took: Duration) -> Self {
        Self { city: city.into(), temp, took: format!("{took:.2?}") }
    }
}
