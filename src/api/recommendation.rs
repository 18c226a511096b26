//! Recommendation proxy for the dashboard's chat widget.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::domain::{select_best, SiteRecord};
use crate::pipeline::AppState;
use crate::recommend::SearchType;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
    #[serde(default, rename = "excludedSites")]
    pub excluded_sites: Vec<String>,
    #[serde(default, rename = "searchType")]
    pub search_type: Option<SearchType>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SiteRecord>,
    #[serde(rename = "photoUrl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// POST /api/v1/sites/recommendation
///
/// Never fails: generation errors degrade to the rule-based template.
pub async fn post_recommendation(
    State(st): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Json<RecommendationResponse> {
    let candidates: Vec<&SiteRecord> = req
        .sites
        .iter()
        .filter(|s| !req.excluded_sites.contains(&s.name))
        .collect();
    let search = req.search_type.unwrap_or(SearchType::Location);

    let recommendation = st
        .recommendations
        .search_guidance(search, &candidates)
        .await;

    // Location searches also surface the pick so the map can fly to it.
    let location = match search {
        SearchType::Location => select_best(candidates.iter().copied()).cloned(),
        SearchType::Facility | SearchType::Analysis => None,
    };

    let photo_url = match &location {
        Some(site) => st.recommendations.site_photo_url(site).await,
        None => None,
    };

    Json(RecommendationResponse {
        recommendation,
        location,
        photo_url,
    })
}
