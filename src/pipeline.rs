//! Request pipeline: concurrent fan-out over the registry, cache policy and
//! application wiring.

use anyhow::Result;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::aggregate::{PanelModel, SiteAggregator};
use crate::cache::{JsonFileStore, SiteStore};
use crate::config::Config;
use crate::domain::{CacheDocument, SiteConfig, SiteRecord};
use crate::fetch::{NasaPowerClient, OpenMeteoClient, SolarProvider, WeatherProvider};
use crate::recommend::openai::OpenAiGenerator;
use crate::recommend::{DisabledGenerator, RecommendationService, TextGenerator};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Full refresh produced no usable record for any site.
    #[error("could not fetch data for any site")]
    NoSitesAvailable,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Launches both upstream calls for every requested site before awaiting any
/// of them, then pairs responses back to sites by input position.
pub struct SiteOrchestrator {
    solar: Arc<dyn SolarProvider>,
    weather: Arc<dyn WeatherProvider>,
    aggregator: SiteAggregator,
    rng_seed: Option<u64>,
}

impl SiteOrchestrator {
    pub fn new(
        solar: Arc<dyn SolarProvider>,
        weather: Arc<dyn WeatherProvider>,
        aggregator: SiteAggregator,
        rng_seed: Option<u64>,
    ) -> Self {
        Self {
            solar,
            weather,
            aggregator,
            rng_seed,
        }
    }

    /// One record per usable site, in input order. Sites whose solar series
    /// is unavailable are dropped; a failed weather call only nulls that
    /// record's snapshot.
    pub async fn analyze_sites(&self, sites: &[SiteConfig]) -> Vec<SiteRecord> {
        let tasks = sites
            .iter()
            .enumerate()
            .map(|(index, site)| self.analyze_one(index, site));
        join_all(tasks).await.into_iter().flatten().collect()
    }

    async fn analyze_one(&self, index: usize, site: &SiteConfig) -> Option<SiteRecord> {
        let (solar, weather) = tokio::join!(
            self.solar.daily_irradiance(site.lat, site.lon),
            self.weather.current_snapshot(site.lat, site.lon)
        );

        let series = match solar {
            Ok(series) => series,
            Err(e) => {
                warn!(site = %site.name, error = %e, "solar fetch failed, dropping site");
                return None;
            }
        };
        let weather = match weather {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(site = %site.name, error = %e, "weather fetch failed, continuing without it");
                None
            }
        };

        let mut rng = self.task_rng(index);
        self.aggregator
            .aggregate(site, &series, weather, &mut rng)
            .await
    }

    fn task_rng(&self, index: usize) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Cache policy over the orchestrator: serve cached, refresh one site, or
/// rebuild the whole document.
pub struct SitePipeline {
    registry: Vec<SiteConfig>,
    orchestrator: SiteOrchestrator,
    store: Arc<dyn SiteStore>,
    /// Serializes the cache read-modify-write cycle within this process.
    refresh_gate: Mutex<()>,
}

impl SitePipeline {
    pub fn new(
        registry: Vec<SiteConfig>,
        orchestrator: SiteOrchestrator,
        store: Arc<dyn SiteStore>,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            store,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &[SiteConfig] {
        &self.registry
    }

    /// Resolve one dashboard request.
    ///
    /// Without a force flag, a valid cache is returned as-is; a `site_name`
    /// filter refreshes only that site and merges it into the cache. A forced
    /// or cache-less request rebuilds the document from the full registry.
    pub async fn sites_snapshot(
        &self,
        force_refresh: bool,
        site_name: Option<&str>,
    ) -> Result<CacheDocument, PipelineError> {
        let _gate = self.refresh_gate.lock().await;

        if !force_refresh {
            if let Some(cached) = self.store.load().await {
                let Some(name) = site_name else {
                    return Ok(cached);
                };
                return self.refresh_single(cached, name).await;
            }
        }

        self.full_refresh().await
    }

    async fn refresh_single(
        &self,
        cached: CacheDocument,
        name: &str,
    ) -> Result<CacheDocument, PipelineError> {
        let subset: Vec<SiteConfig> = self
            .registry
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect();

        let records = self.orchestrator.analyze_sites(&subset).await;

        let mut doc = cached;
        let mut changed = false;
        for record in records {
            if doc.sites.iter().any(|s| s.name == record.name) {
                changed = true;
            }
            doc = self.store.merge_site(doc, record);
        }

        if changed {
            info!(site = name, "merged refreshed site into cache");
            self.store.save(&doc).await?;
        }
        Ok(doc)
    }

    async fn full_refresh(&self) -> Result<CacheDocument, PipelineError> {
        let records = self.orchestrator.analyze_sites(&self.registry).await;
        if records.is_empty() {
            return Err(PipelineError::NoSitesAvailable);
        }

        info!(sites = records.len(), "full registry refresh complete");
        let doc = CacheDocument::from_records(records);
        self.store.save(&doc).await?;
        Ok(doc)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub pipeline: Arc<SitePipeline>,
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let solar = Arc::new(NasaPowerClient::new(&cfg.solar)?);
        let weather = Arc::new(OpenMeteoClient::new(&cfg.weather)?);

        let generator: Arc<dyn TextGenerator> = if cfg.ai.enabled && !cfg.ai.api_key.is_empty() {
            Arc::new(OpenAiGenerator::new(&cfg.ai)?)
        } else {
            Arc::new(DisabledGenerator)
        };
        let recommendations = Arc::new(RecommendationService::new(generator));

        let panel = PanelModel {
            area_m2: cfg.panel.area_m2,
            efficiency: cfg.panel.efficiency,
        };
        let aggregator = SiteAggregator::new(panel, recommendations.clone());
        let orchestrator = SiteOrchestrator::new(solar, weather, aggregator, None);

        let store: Arc<dyn SiteStore> = Arc::new(JsonFileStore::new(cfg.cache.path.clone()));
        let pipeline = Arc::new(SitePipeline::new(cfg.sites.clone(), orchestrator, store));

        Ok(Self {
            cfg,
            pipeline,
            recommendations,
        })
    }
}
