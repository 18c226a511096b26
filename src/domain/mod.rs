pub mod site;
pub mod weather;

pub use site::{
    select_best, CacheDocument, HardwareTelemetry, RawSolarSeries, SiteConfig, SiteRecord,
};
pub use weather::{CurrentWeather, WeatherSnapshot};
