//! Upstream data clients.
//!
//! Each fetcher issues one HTTP request per site given (lat, lon). Failures
//! are surfaced as errors to the orchestrator, which degrades per site and
//! never retries.

pub mod solar;
pub mod weather;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{RawSolarSeries, WeatherSnapshot};

#[async_trait]
pub trait SolarProvider: Send + Sync {
    /// Daily irradiance series for a location over the configured window.
    async fn daily_irradiance(&self, lat: f64, lon: f64) -> Result<RawSolarSeries>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Instantaneous conditions for a location.
    async fn current_snapshot(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;
}

pub use solar::NasaPowerClient;
pub use weather::OpenMeteoClient;
