//! Core site entities: candidate configuration, aggregated records and the
//! persisted cache document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::weather::WeatherSnapshot;

/// Daily irradiance series keyed by upstream date string (YYYYMMDD), in
/// MJ/m2/day. Negative values are upstream sentinels for missing data.
pub type RawSolarSeries = BTreeMap<String, f64>;

/// A candidate site. Static configuration; `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SiteConfig {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    pub energy_type: String,
}

/// Mocked hardware telemetry attached to every record. Not derived from any
/// real input; `gpu_used` never exceeds `gpu_total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareTelemetry {
    pub gpu_total: u32,
    pub gpu_used: u32,
    pub battery_brand: String,
    pub battery_capacity_mwh: u32,
}

/// Aggregated per-site result. Immutable once constructed; a refresh replaces
/// the record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub energy_type: String,
    pub total_kwh: f64,
    pub avg_daily_kwh: f64,
    pub annual_kwh_yr: f64,
    pub weather: Option<WeatherSnapshot>,
    pub performance_score: f64,
    pub recommendation: String,
    pub hardware: HardwareTelemetry,
}

/// The persisted dashboard document.
///
/// Invariant: `best_site` and `efficiency_score` are always derived from
/// `sites` via [`CacheDocument::rebuild_derived`], never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheDocument {
    pub sites: Vec<SiteRecord>,
    #[serde(rename = "bestSite")]
    pub best_site: Option<SiteRecord>,
    #[serde(rename = "efficiencyScore", default)]
    pub efficiency_score: u32,
}

impl CacheDocument {
    pub fn from_records(sites: Vec<SiteRecord>) -> Self {
        let mut doc = Self {
            sites,
            best_site: None,
            efficiency_score: 0,
        };
        doc.rebuild_derived();
        doc
    }

    /// Recompute `best_site` and `efficiency_score` from `sites`.
    pub fn rebuild_derived(&mut self) {
        self.best_site = select_best(&self.sites).cloned();
        self.efficiency_score = efficiency_score(self.best_site.as_ref());
    }
}

/// Pick the record with the highest `avg_daily_kwh`. Ties break to the first
/// maximum seen; `None` for an empty input.
pub fn select_best<'a, I>(records: I) -> Option<&'a SiteRecord>
where
    I: IntoIterator<Item = &'a SiteRecord>,
{
    let mut best: Option<&SiteRecord> = None;
    for record in records {
        match best {
            Some(current) if record.avg_daily_kwh > current.avg_daily_kwh => {
                best = Some(record);
            }
            None => best = Some(record),
            _ => {}
        }
    }
    best
}

/// Simplified efficiency figure for the best site, scaled to a percentage and
/// capped at 95.
pub fn efficiency_score(best: Option<&SiteRecord>) -> u32 {
    match best {
        Some(site) => {
            let scaled = (site.avg_daily_kwh / 10_000.0 * 80.0).round() as i64 + 15;
            scaled.clamp(0, 95) as u32
        }
        None => 0,
    }
}
