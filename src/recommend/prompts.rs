//! Prompt construction for the generation service.

use super::{SearchType, SiteOutlook};
use crate::domain::{CurrentWeather, SiteRecord};

pub const SYSTEM_PROMPT: &str = "You are an expert energy analyst specializing in renewable energy optimization and site analysis. Provide concise, actionable insights.";

/// Per-site analysis prompt. Weather defaults to a neutral 25 degC ambient
/// assumption when the snapshot is missing.
pub fn site_analysis(outlook: &SiteOutlook<'_>, weather: Option<&CurrentWeather>) -> String {
    let weather_info = match weather {
        Some(current) => format!(
            "Current weather: Temperature {}degC, Wind Speed {} m/s, Cloud Cover {}%.",
            current.temperature_or_neutral(),
            current.wind_speed_10m.unwrap_or(0.0),
            current.cloud_cover.unwrap_or(0.0)
        ),
        None => {
            "Current weather is unavailable; assume a neutral 25degC ambient temperature.".to_string()
        }
    };

    format!(
        "Analyze this energy site and provide a brief, professional recommendation:\n\n\
        Site: {}\n\
        Energy Type: {}\n\
        Average Daily Production: {} kWh\n\
        {}\n\n\
        Provide a 2-3 sentence recommendation focusing on:\n\
        1. Current performance assessment\n\
        2. Potential optimization opportunities\n\
        3. Any environmental considerations\n\n\
        Keep the response concise and actionable.",
        outlook.name,
        outlook.energy_type,
        outlook.avg_daily_kwh.round(),
        weather_info
    )
}

/// Aggregate search prompt over the posted site list.
pub fn search_guidance(search: SearchType, candidates: &[&SiteRecord]) -> String {
    if candidates.is_empty() {
        return "As an expert AI in energy infrastructure, find the most optimal places for a \
            large-scale LG Battery installation. Consider factors like proximity to renewable \
            energy sources (solar, wind), grid stability, and land availability. Provide a \
            brief, actionable recommendation of 2-3 locations in general terms, as no specific \
            site data is available."
            .to_string();
    }

    let objective = match search {
        SearchType::Location => {
            "find the most optimal places for a large-scale LG Battery installation"
        }
        SearchType::Facility => "find the best location for building a new computing facility",
        SearchType::Analysis => {
            "analyze the overall portfolio and call out the strongest and weakest sites"
        }
    };

    let mut prompt = format!(
        "As an expert AI in energy infrastructure, analyze the following site data to {objective}. \
        Consider all factors including energy type, performance score, weather (especially \
        temperature), and existing hardware. Provide a brief, actionable recommendation of the \
        top 2-3 locations from the list provided. Justify your choices with the data.\n\nSite Data:\n"
    );
    for site in candidates {
        let temp = site
            .weather
            .as_ref()
            .and_then(|w| w.current.as_ref())
            .and_then(|c| c.temperature_2m)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        prompt.push_str(&format!(
            "- Name: {}, Type: {}, Score: {}, Temp: {}degC, Avg kWh: {}\n",
            site.name,
            site.energy_type,
            site.performance_score,
            temp,
            site.avg_daily_kwh.round()
        ));
    }
    prompt
}

/// Image prompt for a recommended site.
pub fn site_photo(site: &SiteRecord) -> String {
    format!(
        "Aerial photograph of a large-scale {} energy installation near {}, wide landscape, \
        photorealistic, daytime.",
        site.energy_type, site.name
    )
}
