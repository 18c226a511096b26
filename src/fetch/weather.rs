//! Open-Meteo current-conditions client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use super::WeatherProvider;
use crate::config::WeatherApiConfig;
use crate::domain::WeatherSnapshot;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,cloud_cover,wind_speed_10m,wind_direction_10m";

#[derive(Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(cfg: &WeatherApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("solar-site-analyzer/0.1"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/v1/forecast?latitude={}&longitude={}&current={}&timezone=auto",
            self.base_url, lat, lon, CURRENT_FIELDS
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current_snapshot(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        let url = self.url_for(lat, lon);
        debug!(%url, "fetching live weather");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("weather GET failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("weather API error: HTTP {status}");
        }

        resp.json::<WeatherSnapshot>()
            .await
            .context("weather JSON parse failed")
    }
}
