//! Live weather snapshot as returned by the current-conditions upstream.
//!
//! The whole snapshot may be absent for a site when the weather call failed;
//! consumers fall back to a neutral 25 degC assumption for temperature logic.

use serde::{Deserialize, Serialize};

/// Neutral ambient temperature assumed when no weather data is available.
pub const NEUTRAL_TEMPERATURE_C: f64 = 25.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentWeather>,
}

/// Instantaneous conditions. All fields optional; upstreams omit what they
/// cannot measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparent_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_10m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_10m: Option<f64>,
}

impl CurrentWeather {
    /// Temperature with the neutral fallback applied.
    pub fn temperature_or_neutral(&self) -> f64 {
        self.temperature_2m.unwrap_or(NEUTRAL_TEMPERATURE_C)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_current_block() {
        let snapshot: WeatherSnapshot = serde_json::from_value(serde_json::json!({
            "latitude": 31.875,
            "longitude": -101.5,
            "timezone": "America/Chicago",
            "current": { "temperature_2m": 31.4, "wind_speed_10m": 22.3 },
            "current_units": { "temperature_2m": "degC" }
        }))
        .unwrap();

        let current = snapshot.current.unwrap();
        assert_eq!(current.temperature_2m, Some(31.4));
        assert_eq!(current.wind_speed_10m, Some(22.3));
        assert_eq!(current.cloud_cover, None);
    }

    #[test]
    fn neutral_temperature_fallback() {
        let current = CurrentWeather::default();
        assert_eq!(current.temperature_or_neutral(), NEUTRAL_TEMPERATURE_C);
    }
}
