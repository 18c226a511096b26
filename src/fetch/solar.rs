//! NASA POWER daily-point client for surface irradiance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::SolarProvider;
use crate::config::SolarApiConfig;
use crate::domain::RawSolarSeries;

#[derive(Clone)]
pub struct NasaPowerClient {
    client: reqwest::Client,
    base_url: String,
    parameter: String,
    community: String,
    start: String,
    end: String,
}

impl NasaPowerClient {
    pub fn new(cfg: &SolarApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("solar-site-analyzer/0.1"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            parameter: cfg.parameter.clone(),
            community: cfg.community.clone(),
            start: cfg.start.clone(),
            end: cfg.end.clone(),
        })
    }

    fn url_for(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/api/temporal/daily/point?parameters={}&community={}&start={}&end={}&latitude={}&longitude={}&format=JSON",
            self.base_url, self.parameter, self.community, self.start, self.end, lat, lon
        )
    }
}

#[async_trait]
impl SolarProvider for NasaPowerClient {
    async fn daily_irradiance(&self, lat: f64, lon: f64) -> Result<RawSolarSeries> {
        let url = self.url_for(lat, lon);
        debug!(%url, "fetching daily irradiance");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("solar GET failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("solar API error: HTTP {status}");
        }

        let body: PowerResponse = resp.json().await.context("solar JSON parse failed")?;
        let series = body
            .properties
            .and_then(|p| p.parameter)
            .and_then(|mut params| params.remove(&self.parameter))
            .with_context(|| format!("solar payload missing parameter {}", self.parameter))?;

        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Option<PowerProperties>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: Option<BTreeMap<String, RawSolarSeries>>,
}
