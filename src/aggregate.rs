//! Site aggregation: raw irradiance series + weather snapshot -> SiteRecord.

use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{HardwareTelemetry, RawSolarSeries, SiteConfig, SiteRecord, WeatherSnapshot};
use crate::recommend::{RecommendationService, SiteOutlook};

/// 1 MJ = 0.277778 kWh.
pub const MJ_TO_KWH: f64 = 0.277778;

pub const BATTERY_BRAND: &str = "LG";

/// Fixed PV installation model used for the energy conversion.
#[derive(Debug, Clone, Copy)]
pub struct PanelModel {
    pub area_m2: f64,
    pub efficiency: f64,
}

impl PanelModel {
    /// Energy produced on one day from irradiance in MJ/m2/day.
    pub fn daily_kwh(&self, irradiance_mj: f64) -> f64 {
        irradiance_mj * MJ_TO_KWH * self.area_m2 * self.efficiency
    }
}

/// Deterministic production metrics derived from an irradiance series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionStats {
    pub total_kwh: f64,
    pub avg_daily_kwh: f64,
    pub annual_kwh_yr: f64,
    pub retained_days: usize,
}

/// Sum and average the series, skipping negative sentinel values. `None` when
/// no date survives the filter.
pub fn production_stats(panel: &PanelModel, series: &RawSolarSeries) -> Option<ProductionStats> {
    let mut total_kwh = 0.0;
    let mut retained_days = 0usize;

    for (_date, irradiance) in series.iter() {
        if *irradiance < 0.0 {
            continue;
        }
        total_kwh += panel.daily_kwh(*irradiance);
        retained_days += 1;
    }

    if retained_days == 0 {
        return None;
    }

    let avg_daily_kwh = total_kwh / retained_days as f64;
    Some(ProductionStats {
        total_kwh,
        avg_daily_kwh,
        annual_kwh_yr: avg_daily_kwh * 365.0,
        retained_days,
    })
}

/// Bounded [1, 10] heuristic: average output plus uniform mock jitter standing
/// in for unmodeled factors. Not a physical measurement; tests pin the rng.
pub fn performance_score<R: Rng + ?Sized>(avg_daily_kwh: f64, rng: &mut R) -> f64 {
    let jitter = rng.gen_range(0..=10) as f64 / 10.0;
    let raw = avg_daily_kwh / 500.0 + jitter;
    (raw.clamp(1.0, 10.0) * 10.0).round() / 10.0
}

/// Mock hardware inventory. `gpu_used` is drawn within `gpu_total`.
pub fn mock_hardware<R: Rng + ?Sized>(rng: &mut R) -> HardwareTelemetry {
    let gpu_total = rng.gen_range(500..=2000);
    let gpu_used = rng.gen_range(100..=gpu_total);
    HardwareTelemetry {
        gpu_total,
        gpu_used,
        battery_brand: BATTERY_BRAND.to_string(),
        battery_capacity_mwh: rng.gen_range(5..=20),
    }
}

pub struct SiteAggregator {
    panel: PanelModel,
    recommendations: Arc<RecommendationService>,
}

impl SiteAggregator {
    pub fn new(panel: PanelModel, recommendations: Arc<RecommendationService>) -> Self {
        Self {
            panel,
            recommendations,
        }
    }

    /// Build the full record for one site. `None` when the series has no
    /// usable dates.
    pub async fn aggregate<R: Rng + Send + ?Sized>(
        &self,
        site: &SiteConfig,
        series: &RawSolarSeries,
        weather: Option<WeatherSnapshot>,
        rng: &mut R,
    ) -> Option<SiteRecord> {
        let stats = match production_stats(&self.panel, series) {
            Some(stats) => stats,
            None => {
                debug!(site = %site.name, "no usable irradiance data, dropping site");
                return None;
            }
        };

        let performance_score = performance_score(stats.avg_daily_kwh, rng);
        let hardware = mock_hardware(rng);

        let outlook = SiteOutlook {
            name: &site.name,
            energy_type: &site.energy_type,
            avg_daily_kwh: stats.avg_daily_kwh,
        };
        let current = weather.as_ref().and_then(|w| w.current.as_ref());
        let recommendation = self
            .recommendations
            .site_recommendation(&outlook, current)
            .await;

        Some(SiteRecord {
            name: site.name.clone(),
            lat: site.lat,
            lon: site.lon,
            energy_type: site.energy_type.clone(),
            total_kwh: stats.total_kwh,
            avg_daily_kwh: stats.avg_daily_kwh,
            annual_kwh_yr: stats.annual_kwh_yr,
            weather,
            performance_score,
            recommendation,
            hardware,
        })
    }
}
