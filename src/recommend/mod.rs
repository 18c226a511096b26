//! Site recommendations.
//!
//! Text comes from an external generation service when configured; every call
//! degrades to the deterministic rule-based template, so recommendation
//! failures are never surfaced to callers.

pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::{select_best, CurrentWeather, SiteRecord};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation is disabled")]
    Disabled,
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation API returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("generation response missing expected content")]
    MalformedResponse,
}

/// Capability seam for the external text/image generation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn text(&self, prompt: &str) -> Result<String, GeneratorError>;

    async fn image_url(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}

/// Generator used when no AI service is configured. Always defers to the
/// rule-based fallback.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn text(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}

/// The inputs the recommendation text is keyed on.
#[derive(Debug, Clone, Copy)]
pub struct SiteOutlook<'a> {
    pub name: &'a str,
    pub energy_type: &'a str,
    pub avg_daily_kwh: f64,
}

/// Aggregate search flavors requested by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchType {
    Location,
    Facility,
    Analysis,
}

/// Fallback decorator over a [`TextGenerator`]; never fails.
pub struct RecommendationService {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Per-site recommendation attached to every aggregated record.
    pub async fn site_recommendation(
        &self,
        outlook: &SiteOutlook<'_>,
        weather: Option<&CurrentWeather>,
    ) -> String {
        let prompt = prompts::site_analysis(outlook, weather);
        match self.generator.text(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => basic_recommendation(outlook, weather),
            Err(e) => {
                debug!(site = outlook.name, error = %e, "generator unavailable, using rule-based recommendation");
                basic_recommendation(outlook, weather)
            }
        }
    }

    /// Free-text guidance for the dashboard's aggregate searches.
    pub async fn search_guidance(
        &self,
        search: SearchType,
        candidates: &[&SiteRecord],
    ) -> String {
        let prompt = prompts::search_guidance(search, candidates);
        match self.generator.text(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(_) => basic_guidance(search, candidates),
        }
    }

    /// Illustration for a recommended site, when the image endpoint is
    /// configured. Absent on any failure, never an error.
    pub async fn site_photo_url(&self, site: &SiteRecord) -> Option<String> {
        match self.generator.image_url(&prompts::site_photo(site)).await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(site = %site.name, error = %e, "no illustration available");
                None
            }
        }
    }
}

/// Deterministic rule-based recommendation: production tiers at 4500 and
/// 3000 avg kWh/day, with a wind clause above 20 m/s.
pub fn basic_recommendation(
    outlook: &SiteOutlook<'_>,
    weather: Option<&CurrentWeather>,
) -> String {
    let energy_type = outlook.energy_type;
    let mut recommendation = if outlook.avg_daily_kwh > 4500.0 {
        format!(
            "Excellent performance for {energy_type}. This site demonstrates optimal energy production efficiency."
        )
    } else if outlook.avg_daily_kwh > 3000.0 {
        format!(
            "Good performance for {energy_type}. Consider monitoring for potential optimization opportunities."
        )
    } else {
        format!(
            "Moderate performance for {energy_type}. Review system configuration and environmental factors."
        )
    };

    if let Some(wind) = weather.and_then(|w| w.wind_speed_10m) {
        if wind > 20.0 {
            recommendation
                .push_str(" High wind conditions detected - excellent for wind energy potential.");
        }
    }

    recommendation
}

fn basic_guidance(search: SearchType, candidates: &[&SiteRecord]) -> String {
    match select_best(candidates.iter().copied()) {
        Some(best) => format!(
            "Based on current production data, {} is the strongest {} candidate with an average daily output of {} kWh and a performance score of {}.",
            best.name,
            search,
            best.avg_daily_kwh.round(),
            best.performance_score
        ),
        None => {
            "No site data is available yet. Run a refresh to gather production and weather data for the candidate registry.".to_string()
        }
    }
}
