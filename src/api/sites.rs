//! Dashboard data endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::error::ApiError;
use crate::domain::CacheDocument;
use crate::pipeline::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SitesQuery {
    /// Bypass the cache and refetch the whole registry.
    #[serde(default)]
    pub force_refresh: Option<bool>,
    /// Refresh only the named site and merge it into the cache.
    #[serde(default)]
    pub site_name: Option<String>,
}

/// GET /api/v1/sites
pub async fn get_sites(
    State(st): State<AppState>,
    Query(q): Query<SitesQuery>,
) -> Result<Json<CacheDocument>, ApiError> {
    let force_refresh = q.force_refresh.unwrap_or(false);
    let doc = st
        .pipeline
        .sites_snapshot(force_refresh, q.site_name.as_deref())
        .await?;
    Ok(Json(doc))
}
