use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use validator::Validate;

use crate::domain::SiteConfig;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    #[validate(nested)]
    pub panel: PanelConfig,
    pub solar: SolarApiConfig,
    pub weather: WeatherApiConfig,
    pub ai: AiConfig,
    /// Candidate site registry. Static configuration, never mutated at runtime.
    #[serde(default = "default_site_registry")]
    #[validate(nested, length(min = 1))]
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub path: std::path::PathBuf,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PanelConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub area_m2: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub efficiency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolarApiConfig {
    pub base_url: String,
    /// Irradiance parameter key expected in the upstream payload.
    pub parameter: String,
    pub community: String,
    /// Query window, upstream date format (YYYYMMDD).
    pub start: String,
    pub end: String,
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub http_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub image_enabled: bool,
    pub image_model: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SSA__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn site(name: &str, lat: f64, lon: f64, energy_type: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        lat,
        lon,
        energy_type: energy_type.to_string(),
    }
}

/// Built-in candidate registry, used when no `[[sites]]` tables are configured.
pub fn default_site_registry() -> Vec<SiteConfig> {
    vec![
        site("Garden City, TX", 31.8640, -101.4812, "Wind + Grid"),
        site("McCamey, TX", 31.7833, -102.2046, "Wind + Grid"),
        site("Wolf Hollow, TX", 32.3357, -97.7335, "Natural Gas"),
        site("Texas Oil Field", 31.0000, -101.0000, "Flared Gas"),
        site("Ellendale, ND", 46.1416, -98.4662, "Wind + Grid"),
        site("Jamestown, ND", 46.9103, -98.7039, "Wind + Grid"),
        site("ND Oil Field", 46.0000, -102.0000, "Flared Gas"),
        site("Nebraska Solar", 41.5000, -99.6800, "Solar + Grid"),
        site("Kearney, NE", 40.6995, -99.0819, "Grid"),
        site("Murray, KY", 36.6000, -88.3121, "Grid"),
        site("Hannibal, OH", 40.7334, -80.9430, "Grid"),
        site("Hopedale, OH", 40.3137, -80.7530, "Grid"),
        site("Findlay, OH", 41.0442, -83.6499, "Grid"),
        site("Paraguay Hydro", -25.4078, -54.5892, "Hydroelectric"),
        site("Granbury, TX", 32.3357, -97.7335, "Natural Gas"),
        site("Finland Pilot", 60.1700, 24.9400, "Grid + Heat Recycle"),
        site("Masdar City, Abu Dhabi", 24.4539, 54.3773, "Grid + Clean Energy Certs"),
        site("Mina Zayed, Abu Dhabi", 24.5149, 54.3900, "Grid + Clean Energy Certs"),
    ]
}
